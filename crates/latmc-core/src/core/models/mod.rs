//! Data model for one lattice of the linked pair: nodes, the dense node
//! arena, degree descriptors and from-scratch crystal construction.

pub mod build;
pub mod network;
pub mod node;

pub use network::{ModelError, Network, NetworkKind};
pub use node::Node;
