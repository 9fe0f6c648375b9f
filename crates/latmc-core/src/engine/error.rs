use crate::core::io::IoError;
use crate::core::models::{ModelError, NetworkKind};
use crate::engine::relax::RelaxError;
use thiserror::Error;

/// Errors raised by the move engine.
///
/// Variants split into fatal conditions (the lattice or the search space is
/// broken and the run must stop) and infrastructure failures. Geometrically
/// or energetically rejected moves are *not* errors; they roll back and
/// surface through the controller's counters.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No valid move found after {attempts} candidate selections")]
    SelectionExhausted { attempts: usize },

    #[error(
        "Common-node lookup for base node {base_node} and ring node {ring_node} \
         (excluding {exclude}) resolved to {candidates} candidates after all tie-breaks"
    )]
    TopologicalAmbiguity {
        base_node: usize,
        ring_node: usize,
        exclude: usize,
        candidates: usize,
    },

    #[error(
        "Common-ring lookup for base nodes {base_node_1} and {base_node_2} \
         (excluding ring {exclude}) resolved to {candidates} candidates"
    )]
    RingAmbiguity {
        base_node_1: usize,
        base_node_2: usize,
        exclude: usize,
        candidates: usize,
    },

    #[error("Lattice corruption: {detail}")]
    Corruption { detail: String },

    #[error("Consistency check '{check}' failed in the {lattice} lattice at node {node}")]
    Consistency {
        check: &'static str,
        lattice: NetworkKind,
        node: usize,
    },

    #[error("Relaxation engine failure: {source}")]
    Relaxation {
        #[from]
        source: RelaxError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Io(#[from] IoError),
}
