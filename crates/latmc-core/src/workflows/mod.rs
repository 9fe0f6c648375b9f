//! The user-facing layer: complete simulation procedures built from the
//! engine primitives. Currently a single workflow, simulated annealing of
//! a lattice pair under the configured move type.

pub mod anneal;

pub use anneal::{AnnealOutcome, StageReport};
