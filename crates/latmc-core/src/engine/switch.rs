//! Generating the primitive edit lists for the two Monte Carlo moves.
//!
//! A switch rotates a bond: the edge `b1-b2` keeps its endpoints but swaps
//! which flanking neighbours they bond to, shrinking the two rings that
//! share the edge and growing the two rings beyond it. A mix transfers one
//! unit of coordination across a bond, moving a neighbour from the
//! high-coordination endpoint to the low-coordination one.
//!
//! Generators never mutate the lattice. They emit a [`LatticeEdit`] whose
//! connection operations carry explicit list indices resolved against the
//! pre-edit state; at most one index-sensitive operation targets any one
//! list, so every index stays valid while the edit is applied.

use crate::core::geometry;
use crate::core::models::Network;
use crate::engine::context::LinkedLattice;
use crate::engine::error::EngineError;
use crate::engine::relax::LocalEdit;
use crate::engine::selector::Candidate;
use std::collections::HashSet;

/// An angle as (end, centre, end) node IDs.
pub type Angle = (usize, usize, usize);

/// One primitive adjacency-list operation. `Replace` and `Remove` address a
/// single occurrence by list index; `Push` appends; `InsertDual` splices a
/// new member into a ring's boundary between two existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CnxOp {
    ReplaceNet { node: usize, index: usize, value: usize },
    ReplaceDual { node: usize, index: usize, value: usize },
    RemoveNet { node: usize, index: usize },
    RemoveDual { node: usize, index: usize },
    PushNet { node: usize, value: usize },
    PushDual { node: usize, value: usize },
    InsertDual { node: usize, index: usize, value: usize },
}

impl CnxOp {
    pub fn node(&self) -> usize {
        match *self {
            CnxOp::ReplaceNet { node, .. }
            | CnxOp::ReplaceDual { node, .. }
            | CnxOp::RemoveNet { node, .. }
            | CnxOp::RemoveDual { node, .. }
            | CnxOp::PushNet { node, .. }
            | CnxOp::PushDual { node, .. }
            | CnxOp::InsertDual { node, .. } => node,
        }
    }
}

/// A fully resolved move: the relaxer-facing bond/angle edit plus the
/// topology operations for both lattices and the node sets the controller
/// validates and re-arranges afterwards.
#[derive(Debug, Clone)]
pub struct LatticeEdit {
    pub local: LocalEdit,
    pub ops_a: Vec<CnxOp>,
    pub ops_b: Vec<CnxOp>,
    pub touched_a: Vec<usize>,
    pub touched_b: Vec<usize>,
    /// Every base node whose bonds are length-checked and whose lists are
    /// re-sorted clockwise on acceptance.
    pub involved_nodes: Vec<usize>,
    pub angle_check_nodes: Vec<usize>,
    /// For a switch, the four rings whose centres fix the rotation sense of
    /// the initial coordinate guess.
    pub wind_rings: Option<[usize; 4]>,
    /// The rotated bond, when a coordinate guess applies.
    pub rotation_bond: Option<(usize, usize)>,
}

/// All consecutive-neighbour angle terms at a node, read from its ordered
/// net list.
pub(crate) fn cyclic_angles_at(network: &Network, id: usize) -> Vec<Angle> {
    cyclic_angles(id, &network.nodes[id].net_cnxs)
}

fn cyclic_angles(centre: usize, neighbours: &[usize]) -> Vec<Angle> {
    match neighbours.len() {
        0 | 1 => Vec::new(),
        2 => vec![(neighbours[0], centre, neighbours[1])],
        k => (0..k)
            .map(|i| (neighbours[i], centre, neighbours[(i + 1) % k]))
            .collect(),
    }
}

fn index_of(list: &[usize], value: usize, owner: usize) -> Result<usize, EngineError> {
    list.iter()
        .position(|&x| x == value)
        .ok_or_else(|| EngineError::Corruption {
            detail: format!("node {owner} has no connection to {value}"),
        })
}

/// Index at which `value` splices into a ring boundary between the adjacent
/// members `a` and `b` (either orientation).
fn insert_index_between(list: &[usize], a: usize, b: usize, ring: usize) -> Result<usize, EngineError> {
    let len = list.len();
    for i in 0..len {
        let (x, y) = (list[i], list[(i + 1) % len]);
        if (x, y) == (a, b) || (x, y) == (b, a) {
            return Ok(i + 1);
        }
    }
    Err(EngineError::Corruption {
        detail: format!("ring {ring} members {a} and {b} are not adjacent on its boundary"),
    })
}

fn unique_count(list: &[usize]) -> usize {
    list.iter().collect::<HashSet<_>>().len()
}

/// Builds the edit for a switch move around the candidate bond, or `None`
/// when the local neighbourhood makes the move degenerate.
#[allow(clippy::many_single_char_names)]
pub fn gen_switch_operations(
    lattice: &LinkedLattice,
    candidate: Candidate,
) -> Result<Option<LatticeEdit>, EngineError> {
    let (b1, b2) = candidate.base;
    let (r1, r2) = candidate.rings;
    if b1 == b2 || r1 == r2 {
        return Ok(None);
    }

    // Flanking neighbours of the bond within its two rings. A missing
    // common node anywhere in the walk means the neighbourhood cannot host
    // this move; reject and let the caller redraw.
    let Some(b5) = lattice.find_common_connection(b1, r1, b2)? else {
        return Ok(None);
    };
    let Some(b6) = lattice.find_common_connection(b2, r1, b1)? else {
        return Ok(None);
    };
    let Some(b3) = lattice.find_common_connection(b1, r2, b2)? else {
        return Ok(None);
    };
    let Some(b4) = lattice.find_common_connection(b2, r2, b1)? else {
        return Ok(None);
    };
    // A triangle on either side leaves nothing to rotate into.
    if b5 == b6 || b3 == b4 {
        return Ok(None);
    }
    if b5 == b3 || b5 == b4 || b6 == b3 || b6 == b4 {
        return Ok(None);
    }

    // The rings beyond the flanking bonds, which grow by one member.
    let Some(r3) = lattice.find_common_ring(b1, b5, r1)? else {
        return Ok(None);
    };
    let Some(r4) = lattice.find_common_ring(b2, b6, r1)? else {
        return Ok(None);
    };
    if r3 == r4 || r3 == r2 || r4 == r2 {
        return Ok(None);
    }

    let size = |r: usize| lattice.network_b.nodes[r].dual_cnxs.len();
    if size(r1) == lattice.min_b_cnxs
        || size(r2) == lattice.min_b_cnxs
        || size(r3) == lattice.max_b_cnxs
        || size(r4) == lattice.max_b_cnxs
    {
        return Ok(None);
    }
    // Too few distinct neighbouring rings means the move would wrap a ring
    // onto itself.
    if unique_count(&lattice.network_b.nodes[r1].net_cnxs) <= 3
        || unique_count(&lattice.network_b.nodes[r2].net_cnxs) <= 3
    {
        return Ok(None);
    }

    // Second shell, walking outwards along each ring boundary. These nodes
    // do not rewire but their coordinates relax, so they join the
    // validation and re-sorting set.
    let mut shell = Vec::with_capacity(8);
    for (node, ring, exclude) in [
        (b3, r2, b1),
        (b4, r2, b2),
        (b5, r1, b1),
        (b6, r1, b2),
        (b3, r3, b1),
        (b4, r4, b2),
        (b5, r3, b1),
        (b6, r4, b2),
    ] {
        let Some(next) = lattice.find_common_connection(node, ring, exclude)? else {
            return Ok(None);
        };
        shell.push(next);
    }

    let node_a = |id: usize| &lattice.network_a.nodes[id];
    let node_b = |id: usize| &lattice.network_b.nodes[id];

    // Angle terms are rebuilt wholesale at the four rewired nodes: drop
    // every current cyclic term, add the cyclic terms of the predicted new
    // neighbour lists sorted clockwise. This stays correct at any
    // coordination, unlike a fixed three-coordinated template.
    let mut angle_breaks: Vec<Angle> = Vec::new();
    let mut angle_makes: Vec<Angle> = Vec::new();
    for (id, from, to) in [(b1, b5, b4), (b2, b4, b5), (b4, b2, b1), (b5, b1, b2)] {
        angle_breaks.extend(cyclic_angles_at(&lattice.network_a, id));
        let mut new_list: Vec<usize> = node_a(id)
            .net_cnxs
            .iter()
            .map(|&n| if n == from { to } else { n })
            .collect();
        let centre = lattice.coord_a(id);
        geometry::sort_clockwise(&centre, &lattice.dimensions, &mut new_list, |n| {
            lattice.coord_a(n)
        });
        angle_makes.extend(cyclic_angles(id, &new_list));
    }
    let ops_a = vec![
        CnxOp::ReplaceNet {
            node: b1,
            index: index_of(&node_a(b1).net_cnxs, b5, b1)?,
            value: b4,
        },
        CnxOp::ReplaceNet {
            node: b2,
            index: index_of(&node_a(b2).net_cnxs, b4, b2)?,
            value: b5,
        },
        CnxOp::ReplaceNet {
            node: b4,
            index: index_of(&node_a(b4).net_cnxs, b2, b4)?,
            value: b1,
        },
        CnxOp::ReplaceNet {
            node: b5,
            index: index_of(&node_a(b5).net_cnxs, b1, b5)?,
            value: b2,
        },
        CnxOp::ReplaceDual {
            node: b1,
            index: index_of(&node_a(b1).dual_cnxs, r1, b1)?,
            value: r4,
        },
        CnxOp::ReplaceDual {
            node: b2,
            index: index_of(&node_a(b2).dual_cnxs, r2, b2)?,
            value: r3,
        },
    ];
    let ops_b = vec![
        CnxOp::RemoveNet {
            node: r1,
            index: index_of(&node_b(r1).net_cnxs, r2, r1)?,
        },
        CnxOp::RemoveNet {
            node: r2,
            index: index_of(&node_b(r2).net_cnxs, r1, r2)?,
        },
        CnxOp::PushNet { node: r3, value: r4 },
        CnxOp::PushNet { node: r4, value: r3 },
        CnxOp::RemoveDual {
            node: r1,
            index: index_of(&node_b(r1).dual_cnxs, b1, r1)?,
        },
        CnxOp::RemoveDual {
            node: r2,
            index: index_of(&node_b(r2).dual_cnxs, b2, r2)?,
        },
        CnxOp::InsertDual {
            node: r3,
            index: insert_index_between(&node_b(r3).dual_cnxs, b5, b1, r3)?,
            value: b2,
        },
        CnxOp::InsertDual {
            node: r4,
            index: insert_index_between(&node_b(r4).dual_cnxs, b4, b2, r4)?,
            value: b1,
        },
    ];

    let mut involved = vec![b1, b2, b3, b4, b5, b6];
    involved.extend_from_slice(&shell);
    involved.sort_unstable();
    involved.dedup();

    Ok(Some(LatticeEdit {
        local: LocalEdit {
            bond_breaks: vec![(b1, b5), (b2, b4)],
            bond_makes: vec![(b1, b4), (b2, b5)],
            angle_breaks,
            angle_makes,
            displacements: Vec::new(),
        },
        ops_a,
        ops_b,
        touched_a: vec![b1, b2, b4, b5],
        touched_b: vec![r1, r2, r3, r4],
        involved_nodes: involved,
        angle_check_nodes: vec![b1, b2],
        wind_rings: Some([r2, r4, r1, r3]),
        rotation_bond: Some((b1, b2)),
    }))
}

/// Builds the edit for a mix move across the candidate bond: the endpoint
/// with spare coordination donates one neighbour to the other. `None` when
/// neither endpoint can donate or the neighbourhood is degenerate.
pub fn gen_mix_operations(
    lattice: &LinkedLattice,
    candidate: Candidate,
) -> Result<Option<LatticeEdit>, EngineError> {
    let (b1, b2) = candidate.base;
    let (r1, r2_hint) = candidate.rings;
    if b1 == b2 || r1 == r2_hint {
        return Ok(None);
    }
    let degree = |id: usize| lattice.network_a.nodes[id].degree();
    let can_transfer = |donor: usize, acceptor: usize| {
        degree(donor) > lattice.min_a_cnxs && degree(acceptor) < lattice.max_a_cnxs
    };
    let (donor, acceptor) = if can_transfer(b1, b2) {
        (b1, b2)
    } else if can_transfer(b2, b1) {
        (b2, b1)
    } else {
        return Ok(None);
    };

    // The neighbour being transferred sits next to the donor on r1's
    // boundary; the ring across the transferred bond gains the acceptor.
    let Some(b5) = lattice.find_common_connection(donor, r1, acceptor)? else {
        return Ok(None);
    };
    let Some(r2) = lattice.find_common_ring(donor, acceptor, r1)? else {
        return Ok(None);
    };
    let Some(r3) = lattice.find_common_ring(donor, b5, r1)? else {
        return Ok(None);
    };
    if r3 == r2 || r3 == r1 {
        return Ok(None);
    }
    // The transfer would double an existing bond.
    if lattice.network_a.nodes[acceptor].net_cnxs.contains(&b5) {
        return Ok(None);
    }
    let size = |r: usize| lattice.network_b.nodes[r].dual_cnxs.len();
    if size(r1) == lattice.min_b_cnxs || size(r3) == lattice.max_b_cnxs {
        return Ok(None);
    }

    let node_a = |id: usize| &lattice.network_a.nodes[id];
    let node_b = |id: usize| &lattice.network_b.nodes[id];
    let ops_a = vec![
        CnxOp::RemoveNet {
            node: donor,
            index: index_of(&node_a(donor).net_cnxs, b5, donor)?,
        },
        CnxOp::RemoveDual {
            node: donor,
            index: index_of(&node_a(donor).dual_cnxs, r1, donor)?,
        },
        CnxOp::PushNet {
            node: acceptor,
            value: b5,
        },
        CnxOp::PushDual {
            node: acceptor,
            value: r3,
        },
        CnxOp::ReplaceNet {
            node: b5,
            index: index_of(&node_a(b5).net_cnxs, donor, b5)?,
            value: acceptor,
        },
    ];
    let ops_b = vec![
        CnxOp::RemoveNet {
            node: r1,
            index: index_of(&node_b(r1).net_cnxs, r2, r1)?,
        },
        CnxOp::ReplaceNet {
            node: r2,
            index: index_of(&node_b(r2).net_cnxs, r1, r2)?,
            value: r3,
        },
        CnxOp::PushNet { node: r3, value: r2 },
        CnxOp::RemoveDual {
            node: r1,
            index: index_of(&node_b(r1).dual_cnxs, donor, r1)?,
        },
        CnxOp::InsertDual {
            node: r3,
            index: insert_index_between(&node_b(r3).dual_cnxs, donor, b5, r3)?,
            value: acceptor,
        },
    ];

    // Angle terms are rebuilt wholesale at the three re-coordinated nodes:
    // drop every cyclic term of the old lists, add the cyclic terms of the
    // new lists in clockwise order around each node.
    let mut angle_breaks = Vec::new();
    let mut angle_makes = Vec::new();
    for &id in &[donor, acceptor, b5] {
        angle_breaks.extend(cyclic_angles_at(&lattice.network_a, id));
        let mut new_list: Vec<usize> = node_a(id)
            .net_cnxs
            .iter()
            .copied()
            .filter(|&n| !(id == donor && n == b5))
            .map(|n| {
                if id == b5 && n == donor {
                    acceptor
                } else {
                    n
                }
            })
            .collect();
        if id == acceptor {
            new_list.push(b5);
        }
        let centre = lattice.coord_a(id);
        geometry::sort_clockwise(&centre, &lattice.dimensions, &mut new_list, |n| {
            lattice.coord_a(n)
        });
        angle_makes.extend(cyclic_angles(id, &new_list));
    }

    Ok(Some(LatticeEdit {
        local: LocalEdit {
            bond_breaks: vec![(donor, b5)],
            bond_makes: vec![(acceptor, b5)],
            angle_breaks,
            angle_makes,
            displacements: Vec::new(),
        },
        ops_a,
        ops_b,
        touched_a: vec![donor, acceptor, b5],
        touched_b: vec![r1, r2, r3],
        involved_nodes: vec![donor, acceptor, b5],
        angle_check_nodes: vec![donor, acceptor, b5],
        wind_rings: None,
        rotation_bond: None,
    }))
}
