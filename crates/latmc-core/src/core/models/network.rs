use super::node::Node;
use crate::core::geometry;
use nalgebra::{Point2, Vector2};
use std::collections::HashSet;
use thiserror::Error;

/// Which side of the dual pair a network represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// The lattice of physical-atom-like nodes.
    Base,
    /// The lattice whose nodes are the rings (faces) of the base lattice.
    Ring,
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkKind::Base => write!(f, "base"),
            NetworkKind::Ring => write!(f, "ring"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Crystal construction requires even, non-zero ring rows and columns, got {rows}x{cols}")]
    InvalidCrystal { rows: usize, cols: usize },

    #[error("Coordinate buffer holds {got} values but the network needs {expected}")]
    CoordinateCount { expected: usize, got: usize },
}

/// One lattice of the linked pair: a dense, index-stable node arena plus the
/// periodic box and the two aggregate degree descriptors.
///
/// Nodes are never created or destroyed after construction; only their
/// adjacency lists are rewired. `node_distribution[k]` counts nodes of degree
/// k and `edge_distribution[m][n]` counts directed edges from a degree-m node
/// to a degree-n node. Both must always equal the values recomputable from
/// the raw adjacency lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub kind: NetworkKind,
    pub nodes: Vec<Node>,
    pub dimensions: Vector2<f64>,
    pub reciprocal_dimensions: Vector2<f64>,
    pub node_distribution: Vec<usize>,
    pub edge_distribution: Vec<Vec<usize>>,
}

impl Network {
    pub fn new(kind: NetworkKind, dimensions: Vector2<f64>) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            dimensions,
            reciprocal_dimensions: Vector2::new(1.0 / dimensions.x, 1.0 / dimensions.y),
            node_distribution: Vec::new(),
            edge_distribution: Vec::new(),
        }
    }

    pub fn degree(&self, id: usize) -> usize {
        self.nodes[id].degree()
    }

    /// Scales every coordinate and the box by the given factor.
    pub fn rescale(&mut self, factor: f64) {
        self.dimensions *= factor;
        self.reciprocal_dimensions =
            Vector2::new(1.0 / self.dimensions.x, 1.0 / self.dimensions.y);
        for node in &mut self.nodes {
            node.coord *= factor;
        }
    }

    /// Smallest same-lattice degree over all nodes.
    pub fn min_cnxs(&self) -> usize {
        self.nodes.iter().map(Node::degree).min().unwrap_or(0)
    }

    /// Largest same-lattice degree over all nodes.
    pub fn max_cnxs(&self) -> usize {
        self.nodes.iter().map(Node::degree).max().unwrap_or(0)
    }

    /// IDs of all nodes within a periodic-boundary distance of a centre
    /// point (region extraction).
    pub fn nodes_within(&self, centre: &Point2<f64>, radius: f64) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|node| {
                geometry::pbc_vector(centre, &node.coord, &self.dimensions).norm() <= radius
            })
            .map(|node| node.id)
            .collect()
    }

    /// Copies node coordinates into a flat `[x0, y0, x1, y1, ..]` buffer.
    pub fn coordinate_buffer(&self) -> Vec<f64> {
        let mut coords = Vec::with_capacity(2 * self.nodes.len());
        for node in &self.nodes {
            coords.push(node.coord.x);
            coords.push(node.coord.y);
        }
        coords
    }

    /// Overwrites node coordinates from a flat buffer.
    pub fn set_coordinates(&mut self, coords: &[f64]) -> Result<(), ModelError> {
        if coords.len() != 2 * self.nodes.len() {
            return Err(ModelError::CoordinateCount {
                expected: 2 * self.nodes.len(),
                got: coords.len(),
            });
        }
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.coord = Point2::new(coords[2 * i], coords[2 * i + 1]);
        }
        Ok(())
    }

    /// Re-centres every ring node on the periodic mean of its member base
    /// nodes. Called after base coordinates move.
    pub fn centre_rings(&mut self, base: &Network) {
        debug_assert_eq!(self.kind, NetworkKind::Ring);
        let dims = self.dimensions;
        for ring in &mut self.nodes {
            let Some(&first) = ring.dual_cnxs.first() else {
                continue;
            };
            let origin = base.nodes[first].coord;
            let mut displacement = Vector2::zeros();
            for &member in &ring.dual_cnxs {
                displacement += geometry::pbc_vector(&origin, &base.nodes[member].coord, &dims);
            }
            displacement /= ring.dual_cnxs.len() as f64;
            ring.coord = geometry::wrap_point(&(origin + displacement), &dims);
        }
    }

    /// Grows both descriptors so degree `degree` is indexable.
    pub(crate) fn ensure_descriptor_capacity(&mut self, degree: usize) {
        if degree < self.node_distribution.len() {
            return;
        }
        let len = degree + 1;
        self.node_distribution.resize(len, 0);
        for row in &mut self.edge_distribution {
            row.resize(len, 0);
        }
        self.edge_distribution.resize(len, vec![0; len]);
    }

    /// Rebuilds both descriptors from the raw adjacency lists.
    pub fn refresh_descriptors(&mut self) {
        let (node_distribution, edge_distribution) = self.recompute_descriptors();
        self.node_distribution = node_distribution;
        self.edge_distribution = edge_distribution;
    }

    /// Recomputes both descriptors from scratch without storing them, for
    /// consistency verification against the incrementally maintained copies.
    pub fn recompute_descriptors(&self) -> (Vec<usize>, Vec<Vec<usize>>) {
        let cap = self.max_cnxs() + 1;
        let cap = cap.max(self.node_distribution.len());
        let mut node_distribution = vec![0usize; cap];
        let mut edge_distribution = vec![vec![0usize; cap]; cap];
        for node in &self.nodes {
            let m = node.degree();
            node_distribution[m] += 1;
            for &neighbour in &node.net_cnxs {
                let n = self.nodes[neighbour].degree();
                edge_distribution[m][n] += 1;
            }
        }
        (node_distribution, edge_distribution)
    }

    /// Removes the descriptor contributions of the given nodes prior to an
    /// edit. Every directed edge incident to a touched node is dropped once;
    /// an edge between two touched nodes is dropped once from each side.
    pub(crate) fn remove_descriptor_contribution(&mut self, touched: &HashSet<usize>) {
        for &id in touched {
            let m = self.nodes[id].degree();
            self.node_distribution[m] -= 1;
            for i in 0..self.nodes[id].net_cnxs.len() {
                let neighbour = self.nodes[id].net_cnxs[i];
                let n = self.nodes[neighbour].degree();
                self.edge_distribution[m][n] -= 1;
                if !touched.contains(&neighbour) {
                    self.edge_distribution[n][m] -= 1;
                }
            }
        }
    }

    /// Mean same-lattice degree over all nodes.
    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let total: usize = self.nodes.iter().map(Node::degree).sum();
        total as f64 / self.nodes.len() as f64
    }

    /// Pearson correlation of the degrees at the two ends of an edge, read
    /// from the edge descriptor. Zero when every node has the same degree.
    pub fn degree_assortativity(&self) -> f64 {
        let mut count = 0.0;
        let (mut sum_m, mut sum_mm, mut sum_mn) = (0.0, 0.0, 0.0);
        for (m, row) in self.edge_distribution.iter().enumerate() {
            for (n, &edges) in row.iter().enumerate() {
                let w = edges as f64;
                count += w;
                sum_m += w * m as f64;
                sum_mm += w * (m * m) as f64;
                sum_mn += w * (m * n) as f64;
            }
        }
        if count == 0.0 {
            return 0.0;
        }
        // The directed descriptor is symmetric, so both edge ends share the
        // same marginal distribution.
        let mean = sum_m / count;
        let variance = sum_mm / count - mean * mean;
        if variance < 1e-12 {
            return 0.0;
        }
        (sum_mn / count - mean * mean) / variance
    }

    /// Shannon entropy (natural log) of the node degree distribution.
    pub fn degree_entropy(&self) -> f64 {
        let total: usize = self.node_distribution.iter().sum();
        if total == 0 {
            return 0.0;
        }
        self.node_distribution
            .iter()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let p = count as f64 / total as f64;
                -p * p.ln()
            })
            .sum()
    }

    /// Mirror of [`Self::remove_descriptor_contribution`], applied after an
    /// edit with the new adjacency state.
    pub(crate) fn add_descriptor_contribution(&mut self, touched: &HashSet<usize>) {
        let mut max_degree = 0;
        for &id in touched {
            max_degree = max_degree.max(self.nodes[id].degree());
            for &neighbour in &self.nodes[id].net_cnxs {
                max_degree = max_degree.max(self.nodes[neighbour].degree());
            }
        }
        self.ensure_descriptor_capacity(max_degree);
        for &id in touched {
            let m = self.nodes[id].degree();
            self.node_distribution[m] += 1;
            for i in 0..self.nodes[id].net_cnxs.len() {
                let neighbour = self.nodes[id].net_cnxs[i];
                let n = self.nodes[neighbour].degree();
                self.edge_distribution[m][n] += 1;
                if !touched.contains(&neighbour) {
                    self.edge_distribution[n][m] += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::build;

    #[test]
    fn refreshed_descriptors_match_recomputation() {
        let (base, ring) = build::hexagonal_crystal(4, 6).unwrap();
        let (node_dist, edge_dist) = base.recompute_descriptors();
        assert_eq!(base.node_distribution, node_dist);
        assert_eq!(base.edge_distribution, edge_dist);
        let (node_dist, edge_dist) = ring.recompute_descriptors();
        assert_eq!(ring.node_distribution, node_dist);
        assert_eq!(ring.edge_distribution, edge_dist);
    }

    #[test]
    fn rescale_scales_box_and_coordinates() {
        let (mut base, _) = build::hexagonal_crystal(2, 4).unwrap();
        let coord = base.nodes[3].coord;
        let dims = base.dimensions;
        base.rescale(2.0);
        assert!((base.nodes[3].coord.x - 2.0 * coord.x).abs() < 1e-12);
        assert!((base.dimensions.y - 2.0 * dims.y).abs() < 1e-12);
        assert!((base.reciprocal_dimensions.x - 1.0 / base.dimensions.x).abs() < 1e-12);
    }

    #[test]
    fn contribution_removal_and_restore_round_trips() {
        let (mut base, _) = build::hexagonal_crystal(2, 4).unwrap();
        let saved_nodes = base.node_distribution.clone();
        let saved_edges = base.edge_distribution.clone();
        let touched: HashSet<usize> = [0, 1, 5].into_iter().collect();
        base.remove_descriptor_contribution(&touched);
        assert_ne!(base.node_distribution, saved_nodes);
        base.add_descriptor_contribution(&touched);
        assert_eq!(base.node_distribution, saved_nodes);
        assert_eq!(base.edge_distribution, saved_edges);
    }

    #[test]
    fn uniform_degrees_have_zero_entropy_and_assortativity() {
        let (base, _) = build::hexagonal_crystal(2, 4).unwrap();
        assert!((base.average_degree() - 3.0).abs() < 1e-12);
        assert_eq!(base.degree_entropy(), 0.0);
        assert_eq!(base.degree_assortativity(), 0.0);
    }

    #[test]
    fn mixed_degrees_show_in_the_statistics() {
        let (mut base, _) = build::hexagonal_crystal(2, 4).unwrap();
        // Rewire one bond end to make a degree-2 and a degree-4 node.
        let moved = base.nodes[0].net_cnxs.pop().unwrap();
        let pos = base.nodes[moved]
            .net_cnxs
            .iter()
            .position(|&n| n == 0)
            .unwrap();
        base.nodes[moved].net_cnxs[pos] = 1;
        base.nodes[1].net_cnxs.push(moved);
        base.refresh_descriptors();
        assert!(base.degree_entropy() > 0.0);
        assert!(base.average_degree() > 0.0);
        // Perfectly correlated would be 1; a single defect pair sits below.
        assert!(base.degree_assortativity().abs() <= 1.0);
    }

    #[test]
    fn region_extraction_respects_periodic_images() {
        let (base, _) = build::hexagonal_crystal(2, 4).unwrap();
        // A radius larger than the box diagonal captures every node.
        let all = base.nodes_within(&Point2::origin(), base.dimensions.norm());
        assert_eq!(all.len(), base.nodes.len());
        // A tiny radius around a node's own coordinate captures just it.
        let coord = base.nodes[5].coord;
        assert_eq!(base.nodes_within(&coord, 1e-6), vec![5]);
    }
}
