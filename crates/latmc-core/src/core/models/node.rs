use nalgebra::Point2;

/// A vertex of one lattice in a linked pair of networks.
///
/// Nodes are owned exclusively by their [`Network`](super::network::Network)'s
/// dense node array and are referenced everywhere else by plain index. The
/// three adjacency lists hold such indices:
///
/// - `net_cnxs`: same-lattice neighbours, clockwise once settled;
/// - `dual_cnxs`: cross-lattice neighbours (for a base node, the rings that
///   enclose it; for a ring node, its member base nodes);
/// - `aux_cnxs`: second-order ring relations used by some lattice variants.
///
/// For every node `net_cnxs.len() == dual_cnxs.len()` must hold; edits that
/// would break this are rejected before they reach the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: usize,
    pub coord: Point2<f64>,
    pub net_cnxs: Vec<usize>,
    pub dual_cnxs: Vec<usize>,
    pub aux_cnxs: Vec<usize>,
}

impl Node {
    /// Creates an unconnected node at the origin.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            coord: Point2::origin(),
            net_cnxs: Vec::new(),
            dual_cnxs: Vec::new(),
            aux_cnxs: Vec::new(),
        }
    }

    /// Creates an unconnected node at the given coordinate.
    pub fn with_coord(id: usize, coord: Point2<f64>) -> Self {
        Self {
            id,
            coord,
            net_cnxs: Vec::new(),
            dual_cnxs: Vec::new(),
            aux_cnxs: Vec::new(),
        }
    }

    /// Same-lattice degree (coordination number for base nodes, ring size for
    /// ring nodes).
    pub fn degree(&self) -> usize {
        self.net_cnxs.len()
    }

    /// Non-periodic Euclidean distance to a point, used for distance-decay
    /// selection weights.
    pub fn distance_from(&self, point: &Point2<f64>) -> f64 {
        (self.coord - point).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_has_no_connections() {
        let node = Node::new(7);
        assert_eq!(node.id, 7);
        assert_eq!(node.degree(), 0);
        assert!(node.dual_cnxs.is_empty());
        assert!(node.aux_cnxs.is_empty());
        assert_eq!(node.coord, Point2::origin());
    }

    #[test]
    fn distance_from_is_euclidean() {
        let node = Node::with_coord(0, Point2::new(3.0, 4.0));
        assert!((node.distance_from(&Point2::origin()) - 5.0).abs() < 1e-12);
    }
}
