//! The linked base/ring lattice pair the whole engine operates on, plus the
//! shared neighbourhood lookups and the consistency auditor.

use crate::core::geometry;
use crate::core::io::{self, IoError};
use crate::core::models::{build, Network, NetworkKind};
use crate::engine::config::{SelectionMode, SimulationConfig};
use crate::engine::error::EngineError;
use nalgebra::{Point2, Vector2};
use std::collections::HashSet;
use std::path::Path;

/// The dual lattice pair and the engine-facing state layered on top of it:
/// the flat coordinate buffer shared with the relaxer, the current energy,
/// selection weights, and the frozen-region node sets.
#[derive(Debug, Clone)]
pub struct LinkedLattice {
    pub network_a: Network,
    pub network_b: Network,
    pub dimensions: Vector2<f64>,
    pub centre: Point2<f64>,
    /// Flat `[x0, y0, ..]` copy of the base coordinates, kept in lockstep
    /// with the relaxer between moves.
    pub current_coords: Vec<f64>,
    pub energy: f64,
    pub fixed_rings: HashSet<usize>,
    /// Base nodes belonging to any fixed ring; never an endpoint of a move.
    pub fixed_nodes: HashSet<usize>,
    /// Per-base-node selection weights, refreshed after accepted moves.
    pub weights: Vec<f64>,
    pub min_a_cnxs: usize,
    pub max_a_cnxs: usize,
    pub min_b_cnxs: usize,
    pub max_b_cnxs: usize,
    pub selection: SelectionMode,
    pub max_bond_length: f64,
    pub max_angle: f64,
    pub maintain_convexity: bool,
}

impl LinkedLattice {
    fn from_networks(
        network_a: Network,
        network_b: Network,
        config: &SimulationConfig,
    ) -> Self {
        let dimensions = network_a.dimensions;
        let current_coords = network_a.coordinate_buffer();
        let num_nodes = network_a.nodes.len();
        Self {
            network_a,
            network_b,
            dimensions,
            centre: Point2::new(dimensions.x / 2.0, dimensions.y / 2.0),
            current_coords,
            energy: 0.0,
            fixed_rings: HashSet::new(),
            fixed_nodes: HashSet::new(),
            weights: vec![1.0; num_nodes],
            min_a_cnxs: config.min_coordination,
            max_a_cnxs: config.max_coordination,
            min_b_cnxs: config.min_ring_size,
            max_b_cnxs: config.max_ring_size,
            selection: config.selection,
            max_bond_length: config.max_bond_length,
            max_angle: config.max_angle_radians(),
            maintain_convexity: config.maintain_convexity,
        }
    }

    /// Builds a pristine hexagonal crystal of the configured size.
    pub fn from_crystal(config: &SimulationConfig) -> Result<Self, EngineError> {
        let (base, ring) = build::hexagonal_crystal(config.ring_rows, config.ring_cols)?;
        Ok(Self::from_networks(base, ring, config))
    }

    /// Restores a lattice pair from `{prefix}_A_*` and `{prefix}_B_*` files.
    pub fn from_files(prefix: &Path, config: &SimulationConfig) -> Result<Self, EngineError> {
        let base = io::lattice::read_network(&prefix_for(prefix, "A"), NetworkKind::Base)?;
        let mut ring = io::lattice::read_network(&prefix_for(prefix, "B"), NetworkKind::Ring)?;
        validate_cross_references(&base, &ring, prefix)?;
        ring.centre_rings(&base);
        Ok(Self::from_networks(base, ring, config))
    }

    /// Persists the pair alongside a path prefix, the inverse of
    /// [`Self::from_files`].
    pub fn write(&self, prefix: &Path) -> Result<(), IoError> {
        io::lattice::write_network(&self.network_a, &prefix_for(prefix, "A"))?;
        io::lattice::write_network(&self.network_b, &prefix_for(prefix, "B"))
    }

    /// Marks the given rings, and every base node belonging to one, as
    /// immovable.
    pub fn with_fixed_rings(mut self, rings: HashSet<usize>) -> Self {
        self.fixed_nodes = rings
            .iter()
            .filter_map(|&ring| self.network_b.nodes.get(ring))
            .flat_map(|ring| ring.dual_cnxs.iter().copied())
            .collect();
        self.fixed_rings = rings;
        self
    }

    pub fn coord_a(&self, id: usize) -> Point2<f64> {
        Point2::new(self.current_coords[2 * id], self.current_coords[2 * id + 1])
    }

    /// Commits a relaxed coordinate buffer: updates the base nodes and
    /// re-centres every ring on its members.
    pub fn push_coords(&mut self, coords: &[f64]) -> Result<(), EngineError> {
        self.network_a.set_coordinates(coords)?;
        self.current_coords.copy_from_slice(coords);
        self.network_b.centre_rings(&self.network_a);
        Ok(())
    }

    /// Re-sorts a base node's connection lists into clockwise order around
    /// the node, using the supplied coordinate buffer.
    pub fn arrange_neighbours_clockwise(&mut self, id: usize, coords: &[f64]) {
        let dims = self.dimensions;
        let centre = Point2::new(coords[2 * id], coords[2 * id + 1]);
        let node = &mut self.network_a.nodes[id];
        geometry::sort_clockwise(&centre, &dims, &mut node.net_cnxs, |nb| {
            Point2::new(coords[2 * nb], coords[2 * nb + 1])
        });
        let rings = &self.network_b;
        geometry::sort_clockwise(&centre, &dims, &mut node.dual_cnxs, |r| {
            rings.nodes[r].coord
        });
    }

    /// The node shared by `base`'s net list and `ring`'s dual list, other
    /// than `exclude`.
    ///
    /// A well-formed neighbourhood yields exactly one candidate. Zero
    /// candidates can legitimately happen next to low-coordination nodes
    /// and returns `None` so the caller can reject the move. When a small
    /// ring wraps around and produces several, two tie-breaks run in
    /// order: keep candidates cyclically adjacent to `exclude` in `base`'s
    /// ordered net list, then keep candidates sharing a second ring with
    /// `exclude`. Anything still ambiguous is a fatal lattice fault.
    pub fn find_common_connection(
        &self,
        base: usize,
        ring: usize,
        exclude: usize,
    ) -> Result<Option<usize>, EngineError> {
        let net = &self.network_a.nodes[base].net_cnxs;
        let members = &self.network_b.nodes[ring].dual_cnxs;
        let mut candidates: Vec<usize> = net
            .iter()
            .copied()
            .filter(|&n| n != exclude && members.contains(&n))
            .collect();
        if candidates.len() > 1 {
            let adjacent: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&n| self.cyclically_adjacent(base, n, exclude))
                .collect();
            if !adjacent.is_empty() {
                candidates = adjacent;
            }
        }
        if candidates.len() > 1 {
            let exclude_rings = &self.network_a.nodes[exclude].dual_cnxs;
            let shared: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&n| {
                    self.network_a.nodes[n]
                        .dual_cnxs
                        .iter()
                        .any(|r| *r != ring && exclude_rings.contains(r))
                })
                .collect();
            if !shared.is_empty() {
                candidates = shared;
            }
        }
        match candidates.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(EngineError::TopologicalAmbiguity {
                base_node: base,
                ring_node: ring,
                exclude,
                candidates: candidates.len(),
            }),
        }
    }

    /// The ring shared by two base nodes' dual lists, other than `exclude`.
    /// `None` when no such ring exists; several is a fatal lattice fault.
    pub fn find_common_ring(
        &self,
        base_1: usize,
        base_2: usize,
        exclude: usize,
    ) -> Result<Option<usize>, EngineError> {
        let rings_2 = &self.network_a.nodes[base_2].dual_cnxs;
        let candidates: Vec<usize> = self.network_a.nodes[base_1]
            .dual_cnxs
            .iter()
            .copied()
            .filter(|&r| r != exclude && rings_2.contains(&r))
            .collect();
        match candidates.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(EngineError::RingAmbiguity {
                base_node_1: base_1,
                base_node_2: base_2,
                exclude,
                candidates: candidates.len(),
            }),
        }
    }

    /// All rings containing both base nodes.
    pub fn common_rings(&self, base_1: usize, base_2: usize) -> Vec<usize> {
        let rings_2 = &self.network_a.nodes[base_2].dual_cnxs;
        self.network_a.nodes[base_1]
            .dual_cnxs
            .iter()
            .copied()
            .filter(|r| rings_2.contains(r))
            .collect()
    }

    fn cyclically_adjacent(&self, base: usize, a: usize, b: usize) -> bool {
        let net = &self.network_a.nodes[base].net_cnxs;
        let len = net.len();
        net.iter().enumerate().any(|(i, &n)| {
            n == a && (net[(i + 1) % len] == b || net[(i + len - 1) % len] == b)
        })
    }

    /// Audits the full adjacency structure of the pair. Fatal on the first
    /// violated invariant; cheap enough to run after every annealing stage.
    pub fn check_consistency(&self) -> Result<(), EngineError> {
        self.check_cnx_consistency()?;
        self.check_descriptor_consistency()
    }

    pub fn check_cnx_consistency(&self) -> Result<(), EngineError> {
        for node in &self.network_a.nodes {
            if node.net_cnxs.len() != node.dual_cnxs.len() {
                return Err(consistency("net and dual list sizes", NetworkKind::Base, node.id));
            }
            for &nb in &node.net_cnxs {
                if !self.network_a.nodes[nb].net_cnxs.contains(&node.id) {
                    return Err(consistency("mutual net connection", NetworkKind::Base, node.id));
                }
            }
            for &ring in &node.dual_cnxs {
                if !self.network_b.nodes[ring].dual_cnxs.contains(&node.id) {
                    return Err(consistency("mutual dual connection", NetworkKind::Base, node.id));
                }
            }
        }
        for ring in &self.network_b.nodes {
            for &nb in &ring.net_cnxs {
                if !self.network_b.nodes[nb].net_cnxs.contains(&ring.id) {
                    return Err(consistency("mutual net connection", NetworkKind::Ring, ring.id));
                }
            }
            for &member in &ring.dual_cnxs {
                if !self.network_a.nodes[member].dual_cnxs.contains(&ring.id) {
                    return Err(consistency("mutual dual connection", NetworkKind::Ring, ring.id));
                }
            }
        }
        // Ordering invariants: consecutive net neighbours of a base node
        // share one of its rings, and consecutive members of a ring are
        // bonded to each other.
        for node in &self.network_a.nodes {
            let len = node.net_cnxs.len();
            for i in 0..len {
                let a = node.net_cnxs[i];
                let b = node.net_cnxs[(i + 1) % len];
                if self.common_rings(a, b).iter().all(|r| !node.dual_cnxs.contains(r)) {
                    return Err(consistency(
                        "consecutive neighbours share a ring",
                        NetworkKind::Base,
                        node.id,
                    ));
                }
            }
        }
        for ring in &self.network_b.nodes {
            let len = ring.dual_cnxs.len();
            for i in 0..len {
                let a = ring.dual_cnxs[i];
                let b = ring.dual_cnxs[(i + 1) % len];
                if !self.network_a.nodes[a].net_cnxs.contains(&b) {
                    return Err(consistency(
                        "consecutive ring members are bonded",
                        NetworkKind::Ring,
                        ring.id,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Verifies the incrementally maintained degree descriptors against a
    /// from-scratch recomputation.
    pub fn check_descriptor_consistency(&self) -> Result<(), EngineError> {
        for network in [&self.network_a, &self.network_b] {
            let (node_dist, edge_dist) = network.recompute_descriptors();
            if network.node_distribution != node_dist {
                return Err(EngineError::Corruption {
                    detail: format!("{} node distribution drifted from adjacency", network.kind),
                });
            }
            if network.edge_distribution != edge_dist {
                return Err(EngineError::Corruption {
                    detail: format!("{} edge distribution drifted from adjacency", network.kind),
                });
            }
        }
        Ok(())
    }
}

fn consistency(check: &'static str, lattice: NetworkKind, node: usize) -> EngineError {
    EngineError::Consistency {
        check,
        lattice,
        node,
    }
}

fn prefix_for(prefix: &Path, lattice: &str) -> std::path::PathBuf {
    let mut name = prefix
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push("_");
    name.push(lattice);
    prefix.with_file_name(name)
}

fn validate_cross_references(
    base: &Network,
    ring: &Network,
    prefix: &Path,
) -> Result<(), EngineError> {
    let bad_base = base
        .nodes
        .iter()
        .find(|n| n.dual_cnxs.iter().any(|&r| r >= ring.nodes.len()));
    let bad_ring = ring
        .nodes
        .iter()
        .find(|n| n.dual_cnxs.iter().any(|&m| m >= base.nodes.len()));
    if bad_base.is_some() || bad_ring.is_some() {
        return Err(EngineError::Corruption {
            detail: format!(
                "dual references in '{}' point outside the partner lattice",
                prefix.display()
            ),
        });
    }
    Ok(())
}
