//! Drawing the candidate bond a move will act on.
//!
//! The first base node is drawn from the per-node weight table (uniform or
//! distance-weighted), the second uniformly from its neighbours. Candidates
//! touching frozen nodes are redrawn; a bond not shared by exactly two rings
//! means the lattice itself is broken and the run stops.

use crate::core::geometry;
use crate::engine::context::LinkedLattice;
use crate::engine::error::EngineError;
use crate::engine::config::SelectionMode;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// A selected bond and the two rings flanking it, in randomised order.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub base: (usize, usize),
    pub rings: (usize, usize),
}

/// Recomputes the per-node selection weights for the current coordinates.
pub fn update_weights(lattice: &mut LinkedLattice) {
    match lattice.selection {
        SelectionMode::Random => {
            lattice.weights.fill(1.0);
        }
        SelectionMode::Weighted { decay } => {
            let scale = decay / lattice.dimensions.x.min(lattice.dimensions.y);
            for id in 0..lattice.network_a.nodes.len() {
                let distance =
                    geometry::pbc_distance(&lattice.centre, &lattice.coord_a(id), &lattice.dimensions);
                lattice.weights[id] = (-distance * scale).exp();
            }
        }
    }
}

/// Sampling table built from the current per-node weights.
pub struct WeightTable(WeightedIndex<f64>);

pub fn weight_table(lattice: &LinkedLattice) -> Result<WeightTable, EngineError> {
    WeightedIndex::new(&lattice.weights)
        .map(WeightTable)
        .map_err(|e| EngineError::Corruption {
            detail: format!("selection weight table is degenerate: {e}"),
        })
}

/// One weighted draw. `None` means the draw landed on a frozen node or one
/// with no neighbours; the caller spends its own retry budget on those.
pub fn try_pick_connection<R: Rng>(
    lattice: &LinkedLattice,
    table: &WeightTable,
    rng: &mut R,
) -> Result<Option<Candidate>, EngineError> {
    let b1 = table.0.sample(rng);
    let neighbours = &lattice.network_a.nodes[b1].net_cnxs;
    if neighbours.is_empty() {
        return Ok(None);
    }
    let b2 = neighbours[rng.gen_range(0..neighbours.len())];
    if lattice.fixed_nodes.contains(&b1) || lattice.fixed_nodes.contains(&b2) {
        return Ok(None);
    }
    let rings = lattice.common_rings(b1, b2);
    let [r1, r2] = rings.as_slice() else {
        return Err(EngineError::Corruption {
            detail: format!(
                "bond {b1}-{b2} is shared by {} rings, expected 2",
                rings.len()
            ),
        });
    };
    let (r1, r2) = if rng.gen_range(0..2) == 0 {
        (*r1, *r2)
    } else {
        (*r2, *r1)
    };
    Ok(Some(Candidate {
        base: (b1, b2),
        rings: (r1, r2),
    }))
}

/// Draws a movable bond, retrying up to `n^2` times before declaring the
/// search space exhausted.
pub fn pick_random_connection<R: Rng>(
    lattice: &LinkedLattice,
    rng: &mut R,
) -> Result<Candidate, EngineError> {
    let table = weight_table(lattice)?;
    let attempts = lattice.network_a.nodes.len().pow(2);
    for _ in 0..attempts {
        if let Some(candidate) = try_pick_connection(lattice, &table, rng)? {
            return Ok(candidate);
        }
    }
    Err(EngineError::SelectionExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SimulationConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn crystal() -> LinkedLattice {
        LinkedLattice::from_crystal(&SimulationConfig::default()).unwrap()
    }

    #[test]
    fn selected_candidate_is_a_real_bond_with_two_rings() {
        let mut lattice = crystal();
        update_weights(&mut lattice);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let candidate = pick_random_connection(&lattice, &mut rng).unwrap();
            let (b1, b2) = candidate.base;
            assert!(lattice.network_a.nodes[b1].net_cnxs.contains(&b2));
            let (r1, r2) = candidate.rings;
            assert_ne!(r1, r2);
            assert!(lattice.network_a.nodes[b1].dual_cnxs.contains(&r1));
            assert!(lattice.network_a.nodes[b1].dual_cnxs.contains(&r2));
        }
    }

    #[test]
    fn fixed_nodes_are_never_selected() {
        let mut lattice = crystal().with_fixed_rings([0, 1].into_iter().collect());
        update_weights(&mut lattice);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let candidate = pick_random_connection(&lattice, &mut rng).unwrap();
            assert!(!lattice.fixed_nodes.contains(&candidate.base.0));
            assert!(!lattice.fixed_nodes.contains(&candidate.base.1));
        }
    }

    #[test]
    fn single_draws_report_frozen_hits_as_none() {
        let mut lattice = crystal().with_fixed_rings([0].into_iter().collect());
        update_weights(&mut lattice);
        let table = weight_table(&lattice).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let mut skipped = 0;
        for _ in 0..200 {
            match try_pick_connection(&lattice, &table, &mut rng).unwrap() {
                Some(candidate) => {
                    assert!(!lattice.fixed_nodes.contains(&candidate.base.0));
                    assert!(!lattice.fixed_nodes.contains(&candidate.base.1));
                }
                None => skipped += 1,
            }
        }
        assert!(skipped > 0, "no draw ever hit the frozen ring");
    }

    #[test]
    fn fully_frozen_lattice_exhausts_selection() {
        let mut lattice = crystal();
        let all_rings = (0..lattice.network_b.nodes.len()).collect();
        lattice = lattice.with_fixed_rings(all_rings);
        update_weights(&mut lattice);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            pick_random_connection(&lattice, &mut rng),
            Err(EngineError::SelectionExhausted { .. })
        ));
    }

    #[test]
    fn weighted_mode_prefers_the_box_centre() {
        let mut lattice = crystal();
        lattice.selection = SelectionMode::Weighted { decay: 10.0 };
        update_weights(&mut lattice);
        let central = lattice
            .weights
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);
        let centre_id = lattice.weights.iter().position(|&w| w == central).unwrap();
        let far_id = (0..lattice.network_a.nodes.len())
            .max_by(|&a, &b| {
                let da = geometry::pbc_distance(&lattice.centre, &lattice.coord_a(a), &lattice.dimensions);
                let db = geometry::pbc_distance(&lattice.centre, &lattice.coord_a(b), &lattice.dimensions);
                da.total_cmp(&db)
            })
            .unwrap();
        assert!(lattice.weights[centre_id] > lattice.weights[far_id]);
    }
}
