//! From-scratch construction of a periodic honeycomb crystal together with
//! its ring (dual) lattice.
//!
//! The base lattice is laid out brick-wall style: atom rows alternate the
//! column parity of their vertical bonds, which tiles a rectangular periodic
//! box provided the number of atom rows is even. Ring nodes sit at hexagon
//! centres; `ring_rows` counts row boundaries (equal to atom rows) and each
//! boundary carries `ring_cols` hexagons.

use super::network::{ModelError, Network, NetworkKind};
use super::node::Node;
use crate::core::geometry;
use nalgebra::{Point2, Vector2};

const ROW_SPACING: f64 = 1.5;
const STAGGER: f64 = 0.25;

/// Builds a defect-free honeycomb crystal of `ring_rows * ring_cols` rings
/// (`2 * ring_rows * ring_cols` base nodes) with unit bond length, returning
/// `(base, ring)` networks with clockwise-ordered adjacency lists and fresh
/// descriptors.
pub fn hexagonal_crystal(
    ring_rows: usize,
    ring_cols: usize,
) -> Result<(Network, Network), ModelError> {
    if ring_rows < 2 || ring_rows % 2 != 0 || ring_cols < 2 {
        return Err(ModelError::InvalidCrystal {
            rows: ring_rows,
            cols: ring_cols,
        });
    }
    let rows = ring_rows; // atom rows
    let cols = 2 * ring_cols; // atoms per row
    let col_spacing = 3f64.sqrt() / 2.0;
    let dimensions = Vector2::new(cols as f64 * col_spacing, rows as f64 * ROW_SPACING);

    let mut base = Network::new(NetworkKind::Base, dimensions);
    let mut ring = Network::new(NetworkKind::Ring, dimensions);

    let atom_id = |i: usize, j: usize| (i % rows) * cols + (j % cols);
    let has_upward_bond = |i: usize, j: usize| (i + j) % 2 == 0;

    for i in 0..rows {
        for j in 0..cols {
            let offset = if has_upward_bond(i, j) { STAGGER } else { -STAGGER };
            let coord = geometry::wrap_point(
                &Point2::new(j as f64 * col_spacing, i as f64 * ROW_SPACING + offset),
                &dimensions,
            );
            let mut node = Node::with_coord(atom_id(i, j), coord);
            node.net_cnxs.push(atom_id(i, j + cols - 1));
            node.net_cnxs.push(atom_id(i, j + 1));
            if has_upward_bond(i, j) {
                node.net_cnxs.push(atom_id(i + 1, j));
            } else {
                node.net_cnxs.push(atom_id(i + rows - 1, j));
            }
            base.nodes.push(node);
        }
    }

    // Hexagons between atom rows b and b+1, anchored on the vertical bond at
    // column 2m (even boundaries) or 2m + 1 (odd boundaries).
    for b in 0..ring_rows {
        for m in 0..ring_cols {
            let anchor = 2 * m + (b % 2);
            let ring_id = b * ring_cols + m;
            let members = [
                atom_id(b, anchor),
                atom_id(b, anchor + 1),
                atom_id(b, anchor + 2),
                atom_id(b + 1, anchor + 2),
                atom_id(b + 1, anchor + 1),
                atom_id(b + 1, anchor),
            ];
            let mut node = Node::new(ring_id);
            for member in members {
                node.dual_cnxs.push(member);
                base.nodes[member].dual_cnxs.push(ring_id);
            }
            ring.nodes.push(node);
        }
    }

    // Every base edge is shared by exactly two rings; those rings are
    // neighbours in the ring lattice.
    for id in 0..base.nodes.len() {
        for k in 0..base.nodes[id].net_cnxs.len() {
            let neighbour = base.nodes[id].net_cnxs[k];
            if neighbour < id {
                continue;
            }
            let shared: Vec<usize> = base.nodes[id]
                .dual_cnxs
                .iter()
                .filter(|r| base.nodes[neighbour].dual_cnxs.contains(r))
                .copied()
                .collect();
            debug_assert_eq!(shared.len(), 2, "base edge not shared by two rings");
            ring.nodes[shared[0]].net_cnxs.push(shared[1]);
            ring.nodes[shared[1]].net_cnxs.push(shared[0]);
        }
    }

    ring.centre_rings(&base);
    settle_clockwise(&mut base, &ring);
    settle_clockwise(&mut ring, &base);
    base.refresh_descriptors();
    ring.refresh_descriptors();
    Ok((base, ring))
}

/// Sorts every node's `net_cnxs` and `dual_cnxs` clockwise around the node.
fn settle_clockwise(network: &mut Network, dual: &Network) {
    let dimensions = network.dimensions;
    let own_coords: Vec<Point2<f64>> = network.nodes.iter().map(|n| n.coord).collect();
    for node in &mut network.nodes {
        geometry::sort_clockwise(&node.coord, &dimensions, &mut node.net_cnxs, |id| {
            own_coords[id]
        });
        geometry::sort_clockwise(&node.coord, &dimensions, &mut node.dual_cnxs, |id| {
            dual.nodes[id].coord
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_odd_or_tiny_grids() {
        assert!(hexagonal_crystal(3, 6).is_err());
        assert!(hexagonal_crystal(0, 4).is_err());
        assert!(hexagonal_crystal(4, 1).is_err());
    }

    #[test]
    fn crystal_is_three_coordinated_with_six_membered_rings() {
        let (base, ring) = hexagonal_crystal(4, 6).unwrap();
        assert_eq!(base.nodes.len(), 48);
        assert_eq!(ring.nodes.len(), 24);
        for node in &base.nodes {
            assert_eq!(node.net_cnxs.len(), 3);
            assert_eq!(node.dual_cnxs.len(), 3);
        }
        for node in &ring.nodes {
            assert_eq!(node.net_cnxs.len(), 6);
            assert_eq!(node.dual_cnxs.len(), 6);
        }
    }

    #[test]
    fn all_bonds_have_unit_length() {
        let (base, _) = hexagonal_crystal(4, 4).unwrap();
        for node in &base.nodes {
            for &neighbour in &node.net_cnxs {
                let d = geometry::pbc_distance(
                    &node.coord,
                    &base.nodes[neighbour].coord,
                    &base.dimensions,
                );
                assert!((d - 1.0).abs() < 1e-9, "bond {}-{} length {}", node.id, neighbour, d);
            }
        }
    }

    #[test]
    fn adjacency_is_mutual_across_both_lattices() {
        let (base, ring) = hexagonal_crystal(2, 4).unwrap();
        for node in &base.nodes {
            for &neighbour in &node.net_cnxs {
                assert!(base.nodes[neighbour].net_cnxs.contains(&node.id));
            }
            for &r in &node.dual_cnxs {
                assert!(ring.nodes[r].dual_cnxs.contains(&node.id));
            }
        }
        for node in &ring.nodes {
            for &neighbour in &node.net_cnxs {
                assert!(ring.nodes[neighbour].net_cnxs.contains(&node.id));
            }
        }
    }

    #[test]
    fn base_edges_share_exactly_two_rings() {
        let (base, _) = hexagonal_crystal(4, 4).unwrap();
        for node in &base.nodes {
            for &neighbour in &node.net_cnxs {
                let shared = node
                    .dual_cnxs
                    .iter()
                    .filter(|r| base.nodes[neighbour].dual_cnxs.contains(r))
                    .count();
                assert_eq!(shared, 2, "edge {}-{}", node.id, neighbour);
            }
        }
    }
}
