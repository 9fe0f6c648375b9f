//! # LatMC Core Library
//!
//! A Monte Carlo engine for evolving two-dimensional network materials by
//! bond switching and bond mixing, tracking both the atomic lattice and its
//! dual lattice of rings.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers with strictly one-way
//! dependencies:
//!
//! - **[`core`]: The Foundation.** Stateless data models (the dual
//!   [`core::models::Network`] pair), periodic-boundary geometry, crystal
//!   construction and plain-text persistence.
//!
//! - **[`engine`]: The Logic Core.** The stateful move pipeline: candidate
//!   selection, operation generation, transactional topology mutation with
//!   exact rollback, pluggable structural relaxation, geometric validation
//!   and Metropolis acceptance.
//!
//! - **[`workflows`]: The Public API.** Complete procedures tying the
//!   engine together, currently simulated annealing with progress
//!   reporting and per-stage consistency audits.

pub mod core;
pub mod engine;
pub mod workflows;
