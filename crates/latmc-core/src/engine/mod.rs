//! # Engine Module
//!
//! The stateful Monte Carlo layer: everything needed to evolve a linked
//! lattice pair one bond-switching or bond-mixing move at a time.
//!
//! ## Overview
//!
//! A move flows through a fixed pipeline. The [`selector`] draws a candidate
//! bond from the weight table, [`switch`] expands it into primitive
//! connection operations and relaxer terms, [`mutate`] applies those to the
//! lattice under a restorable snapshot, the [`relax`] engine minimises the
//! trial geometry, [`validate`] screens bond lengths, angles and ring
//! convexity, and [`metropolis`] makes the final thermodynamic call. The
//! [`controller`] wires the pipeline together and keeps the tallies.
//!
//! ## Module map
//!
//! - **Configuration** ([`config`]) - every tunable the engine reads, with
//!   TOML and builder front ends
//! - **Shared state** ([`context`]) - the [`context::LinkedLattice`] pair,
//!   neighbourhood lookups and consistency audits
//! - **Relaxation** ([`relax`]) - the [`relax::Relaxer`] trait and the
//!   built-in harmonic implementation
//! - **Progress** ([`progress`]) - callback events for long runs
//! - **Errors** ([`error`]) - fatal engine failures; rejected moves are not
//!   errors

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod metropolis;
pub mod mutate;
pub mod progress;
pub mod relax;
pub mod selector;
pub mod switch;
pub mod validate;

pub use config::{MoveType, SelectionMode, SimulationConfig, TemperatureSchedule};
pub use context::LinkedLattice;
pub use controller::{MoveController, MoveCounters, MoveOutcome};
pub use error::EngineError;
