//! Applying a generated edit to the lattice pair and rolling it back.
//!
//! Rollback is restoration, not inverse editing: the snapshot holds verbatim
//! copies of every node an operation targets plus both networks' degree
//! descriptors, and `restore` writes them back bit for bit.

use crate::core::models::{Network, Node};
use crate::engine::context::LinkedLattice;
use crate::engine::error::EngineError;
use crate::engine::switch::{CnxOp, LatticeEdit};
use std::collections::HashSet;

/// Saved state for one move: the op-target nodes of both lattices and the
/// four descriptor vectors.
#[derive(Debug, Clone)]
pub struct TopologySnapshot {
    nodes_a: Vec<Node>,
    nodes_b: Vec<Node>,
    node_dist_a: Vec<usize>,
    edge_dist_a: Vec<Vec<usize>>,
    node_dist_b: Vec<usize>,
    edge_dist_b: Vec<Vec<usize>>,
}

impl TopologySnapshot {
    pub fn capture(lattice: &LinkedLattice, edit: &LatticeEdit) -> Self {
        let clone_nodes = |network: &Network, ids: &[usize]| {
            ids.iter().map(|&id| network.nodes[id].clone()).collect()
        };
        Self {
            nodes_a: clone_nodes(&lattice.network_a, &edit.touched_a),
            nodes_b: clone_nodes(&lattice.network_b, &edit.touched_b),
            node_dist_a: lattice.network_a.node_distribution.clone(),
            edge_dist_a: lattice.network_a.edge_distribution.clone(),
            node_dist_b: lattice.network_b.node_distribution.clone(),
            edge_dist_b: lattice.network_b.edge_distribution.clone(),
        }
    }

    pub fn restore(self, lattice: &mut LinkedLattice) {
        for node in self.nodes_a {
            let id = node.id;
            lattice.network_a.nodes[id] = node;
        }
        for node in self.nodes_b {
            let id = node.id;
            lattice.network_b.nodes[id] = node;
        }
        lattice.network_a.node_distribution = self.node_dist_a;
        lattice.network_a.edge_distribution = self.edge_dist_a;
        lattice.network_b.node_distribution = self.node_dist_b;
        lattice.network_b.edge_distribution = self.edge_dist_b;
    }
}

/// Applies the edit's connection operations to both lattices, keeping the
/// degree descriptors synchronised via contribution removal and re-add
/// around the touched node sets.
pub fn apply_edit(lattice: &mut LinkedLattice, edit: &LatticeEdit) -> Result<(), EngineError> {
    let touched_a: HashSet<usize> = edit.touched_a.iter().copied().collect();
    let touched_b: HashSet<usize> = edit.touched_b.iter().copied().collect();
    lattice.network_a.remove_descriptor_contribution(&touched_a);
    lattice.network_b.remove_descriptor_contribution(&touched_b);
    apply_ops(&mut lattice.network_a, &edit.ops_a)?;
    apply_ops(&mut lattice.network_b, &edit.ops_b)?;
    lattice.network_a.add_descriptor_contribution(&touched_a);
    lattice.network_b.add_descriptor_contribution(&touched_b);
    Ok(())
}

fn apply_ops(network: &mut Network, ops: &[CnxOp]) -> Result<(), EngineError> {
    for &op in ops {
        let id = op.node();
        let node = network
            .nodes
            .get_mut(id)
            .ok_or_else(|| out_of_range(id, "node", 0))?;
        match op {
            CnxOp::ReplaceNet { index, value, .. } => {
                *node
                    .net_cnxs
                    .get_mut(index)
                    .ok_or_else(|| out_of_range(id, "net index", index))? = value;
            }
            CnxOp::ReplaceDual { index, value, .. } => {
                *node
                    .dual_cnxs
                    .get_mut(index)
                    .ok_or_else(|| out_of_range(id, "dual index", index))? = value;
            }
            CnxOp::RemoveNet { index, .. } => {
                if index >= node.net_cnxs.len() {
                    return Err(out_of_range(id, "net index", index));
                }
                node.net_cnxs.remove(index);
            }
            CnxOp::RemoveDual { index, .. } => {
                if index >= node.dual_cnxs.len() {
                    return Err(out_of_range(id, "dual index", index));
                }
                node.dual_cnxs.remove(index);
            }
            CnxOp::PushNet { value, .. } => node.net_cnxs.push(value),
            CnxOp::PushDual { value, .. } => node.dual_cnxs.push(value),
            CnxOp::InsertDual { index, value, .. } => {
                if index > node.dual_cnxs.len() {
                    return Err(out_of_range(id, "dual insert index", index));
                }
                node.dual_cnxs.insert(index, value);
            }
        }
    }
    Ok(())
}

fn out_of_range(node: usize, what: &str, index: usize) -> EngineError {
    EngineError::Corruption {
        detail: format!("edit addresses {what} {index} out of range at node {node}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SimulationConfig;
    use crate::engine::selector;
    use crate::engine::switch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn crystal() -> LinkedLattice {
        LinkedLattice::from_crystal(&SimulationConfig::default()).unwrap()
    }

    fn switch_edit(lattice: &LinkedLattice, seed: u64) -> LatticeEdit {
        let mut rng = StdRng::seed_from_u64(seed);
        let candidate = selector::pick_random_connection(lattice, &mut rng).unwrap();
        switch::gen_switch_operations(lattice, candidate)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn switch_edit_keeps_descriptors_in_step() {
        let mut lattice = crystal();
        let edit = switch_edit(&lattice, 2);
        apply_edit(&mut lattice, &edit).unwrap();
        lattice.check_descriptor_consistency().unwrap();
        // Base degrees never change under a switch; ring degrees shift one
        // member from the shrinking pair to the growing pair.
        let sizes: Vec<usize> = edit
            .touched_b
            .iter()
            .map(|&r| lattice.network_b.nodes[r].dual_cnxs.len())
            .collect();
        assert_eq!(sizes, vec![5, 5, 7, 7]);
    }

    #[test]
    fn switch_edit_preserves_net_dual_balance() {
        let mut lattice = crystal();
        let edit = switch_edit(&lattice, 9);
        apply_edit(&mut lattice, &edit).unwrap();
        for &id in &edit.involved_nodes {
            let node = &lattice.network_a.nodes[id];
            assert_eq!(node.net_cnxs.len(), node.dual_cnxs.len());
        }
        for &ring in &edit.touched_b {
            let node = &lattice.network_b.nodes[ring];
            assert_eq!(node.net_cnxs.len(), node.dual_cnxs.len());
        }
    }

    #[test]
    fn restore_is_bit_identical() {
        let mut lattice = crystal();
        let pristine = lattice.clone();
        let edit = switch_edit(&lattice, 5);
        let snapshot = TopologySnapshot::capture(&lattice, &edit);
        apply_edit(&mut lattice, &edit).unwrap();
        assert_ne!(lattice.network_a.nodes, pristine.network_a.nodes);
        snapshot.restore(&mut lattice);
        assert_eq!(lattice.network_a.nodes, pristine.network_a.nodes);
        assert_eq!(lattice.network_b.nodes, pristine.network_b.nodes);
        assert_eq!(
            lattice.network_a.node_distribution,
            pristine.network_a.node_distribution
        );
        assert_eq!(
            lattice.network_b.edge_distribution,
            pristine.network_b.edge_distribution
        );
    }

    #[test]
    fn mix_edit_transfers_degree_and_ring_membership() {
        let mut lattice = crystal();
        lattice.min_a_cnxs = 2;
        let mut rng = StdRng::seed_from_u64(7);
        let candidate = selector::pick_random_connection(&lattice, &mut rng).unwrap();
        let edit = switch::gen_mix_operations(&lattice, candidate)
            .unwrap()
            .unwrap();
        let (donor, _) = edit.local.bond_breaks[0];
        let (acceptor, _) = edit.local.bond_makes[0];
        let donor_degree = lattice.network_a.nodes[donor].degree();
        let acceptor_degree = lattice.network_a.nodes[acceptor].degree();
        apply_edit(&mut lattice, &edit).unwrap();
        assert_eq!(lattice.network_a.nodes[donor].degree(), donor_degree - 1);
        assert_eq!(
            lattice.network_a.nodes[acceptor].degree(),
            acceptor_degree + 1
        );
        lattice.check_descriptor_consistency().unwrap();
        for &id in &edit.touched_a {
            let node = &lattice.network_a.nodes[id];
            assert_eq!(node.net_cnxs.len(), node.dual_cnxs.len());
        }
    }

    #[test]
    fn mixed_coordination_switch_round_trips_exactly() {
        let mut lattice = crystal();
        lattice.min_a_cnxs = 2;
        let mut rng = StdRng::seed_from_u64(7);
        let candidate = selector::pick_random_connection(&lattice, &mut rng).unwrap();
        let mix = switch::gen_mix_operations(&lattice, candidate)
            .unwrap()
            .unwrap();
        let (acceptor, _) = mix.local.bond_makes[0];
        apply_edit(&mut lattice, &mix).unwrap();
        assert_eq!(lattice.network_a.nodes[acceptor].degree(), 4);

        // Bonds at the four-coordinated node either generate cleanly or
        // report a degenerate candidate, never an error.
        let neighbours = lattice.network_a.nodes[acceptor].net_cnxs.clone();
        for &b2 in &neighbours {
            let rings = lattice.common_rings(acceptor, b2);
            let candidate = selector::Candidate {
                base: (acceptor, b2),
                rings: (rings[0], rings[1]),
            };
            assert!(switch::gen_switch_operations(&lattice, candidate).is_ok());
        }

        // A switch elsewhere on the mixed lattice must still round-trip
        // bit for bit.
        let pristine = lattice.clone();
        let edit = loop {
            let candidate = selector::pick_random_connection(&lattice, &mut rng).unwrap();
            if let Some(edit) = switch::gen_switch_operations(&lattice, candidate).unwrap() {
                break edit;
            }
        };
        let snapshot = TopologySnapshot::capture(&lattice, &edit);
        apply_edit(&mut lattice, &edit).unwrap();
        lattice.check_descriptor_consistency().unwrap();
        snapshot.restore(&mut lattice);
        assert_eq!(lattice.network_a.nodes, pristine.network_a.nodes);
        assert_eq!(lattice.network_b.nodes, pristine.network_b.nodes);
        assert_eq!(
            lattice.network_a.node_distribution,
            pristine.network_a.node_distribution
        );
        assert_eq!(
            lattice.network_b.edge_distribution,
            pristine.network_b.edge_distribution
        );
    }

    #[test]
    fn out_of_range_op_is_a_corruption_error() {
        let mut lattice = crystal();
        let bogus = LatticeEdit {
            ops_a: vec![CnxOp::RemoveNet { node: 0, index: 99 }],
            ..switch_edit(&lattice, 1)
        };
        assert!(matches!(
            apply_edit(&mut lattice, &bogus),
            Err(EngineError::Corruption { .. })
        ));
    }
}
