//! Geometric acceptance checks run on trial coordinates after relaxation.
//!
//! Validators are pure: they read the (already rewired) topology and a
//! coordinate buffer, and never touch either. Neighbour orderings are
//! sorted on copies; the live lists are only re-arranged when a move
//! commits.

use crate::core::geometry;
use crate::engine::context::LinkedLattice;
use nalgebra::Point2;
use std::f64::consts::TAU;

fn coord(coords: &[f64], id: usize) -> Point2<f64> {
    Point2::new(coords[2 * id], coords[2 * id + 1])
}

/// Every bond incident to one of `ids` must be no longer than the
/// configured maximum.
pub fn check_bond_lengths(lattice: &LinkedLattice, ids: &[usize], coords: &[f64]) -> bool {
    for &id in ids {
        let origin = coord(coords, id);
        for &neighbour in &lattice.network_a.nodes[id].net_cnxs {
            let length =
                geometry::pbc_distance(&origin, &coord(coords, neighbour), &lattice.dimensions);
            if length > lattice.max_bond_length {
                return false;
            }
        }
    }
    true
}

/// Every angular gap between consecutive bonds around each of `ids`,
/// measured on a clockwise-sorted copy of the neighbour list, must be no
/// wider than the configured maximum.
pub fn check_angles_within_range(lattice: &LinkedLattice, ids: &[usize], coords: &[f64]) -> bool {
    for &id in ids {
        let origin = coord(coords, id);
        let mut neighbours = lattice.network_a.nodes[id].net_cnxs.clone();
        if neighbours.len() < 2 {
            continue;
        }
        geometry::sort_clockwise(&origin, &lattice.dimensions, &mut neighbours, |n| {
            coord(coords, n)
        });
        let angles: Vec<f64> = neighbours
            .iter()
            .map(|&n| geometry::clockwise_angle(&origin, &coord(coords, n), &lattice.dimensions))
            .collect();
        for i in 0..angles.len() {
            let gap = if i + 1 < angles.len() {
                angles[i + 1] - angles[i]
            } else {
                TAU - angles[i] + angles[0]
            };
            if gap > lattice.max_angle {
                return false;
            }
        }
    }
    true
}

/// Whether each of the given rings is convex: walking its boundary
/// clockwise, the turn angles must sum to exactly one full rotation.
pub fn check_convexity(lattice: &LinkedLattice, rings: &[usize], coords: &[f64]) -> bool {
    for &ring in rings {
        let members = &lattice.network_b.nodes[ring].dual_cnxs;
        let len = members.len();
        if len < 3 {
            continue;
        }
        let mut total = 0.0;
        for i in 0..len {
            let p0 = coord(coords, members[i]);
            let p1 = coord(coords, members[(i + 1) % len]);
            let p2 = coord(coords, members[(i + 2) % len]);
            let u = geometry::pbc_vector(&p0, &p1, &lattice.dimensions);
            let v = geometry::pbc_vector(&p1, &p2, &lattice.dimensions);
            total += geometry::clockwise_angle_between(&u, &v);
        }
        if (total - TAU).abs() > 1e-12 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SimulationConfig;
    use crate::engine::context::LinkedLattice;

    fn crystal() -> LinkedLattice {
        LinkedLattice::from_crystal(&SimulationConfig::default()).unwrap()
    }

    #[test]
    fn crystal_geometry_passes_all_checks() {
        let lattice = crystal();
        let coords = lattice.current_coords.clone();
        let ids: Vec<usize> = (0..lattice.network_a.nodes.len()).collect();
        let rings: Vec<usize> = (0..lattice.network_b.nodes.len()).collect();
        assert!(check_bond_lengths(&lattice, &ids, &coords));
        assert!(check_angles_within_range(&lattice, &ids, &coords));
        assert!(check_convexity(&lattice, &rings, &coords));
    }

    #[test]
    fn stretched_bond_fails_the_length_check() {
        let lattice = crystal();
        let mut coords = lattice.current_coords.clone();
        // Push node 0 well past the length bound along x.
        coords[0] += lattice.max_bond_length + 1.0;
        assert!(!check_bond_lengths(&lattice, &[0], &coords));
    }

    #[test]
    fn tight_angle_bound_rejects_the_crystal() {
        let mut lattice = crystal();
        // Crystal bond gaps are 120 degrees; bound them at 100.
        lattice.max_angle = 100f64.to_radians();
        let coords = lattice.current_coords.clone();
        assert!(!check_angles_within_range(&lattice, &[0], &coords));
    }

    #[test]
    fn dented_ring_is_not_convex() {
        let lattice = crystal();
        let mut coords = lattice.current_coords.clone();
        // Drag one member of ring 0 onto the far side of the ring centre.
        let ring_centre = lattice.network_b.nodes[0].coord;
        let member = lattice.network_b.nodes[0].dual_cnxs[0];
        let v = geometry::pbc_vector(
            &coord(&coords, member),
            &ring_centre,
            &lattice.dimensions,
        );
        coords[2 * member] += 1.8 * v.x;
        coords[2 * member + 1] += 1.8 * v.y;
        assert!(!check_convexity(&lattice, &[0], &coords));
    }
}
