//! Stateless foundation layer: lattice data model, periodic-boundary
//! geometry and plain-text persistence.

pub mod geometry;
pub mod io;
pub mod models;
