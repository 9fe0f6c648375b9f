//! The consumed structural-relaxation interface.
//!
//! The move engine treats the geometry optimiser as a black box behind
//! [`Relaxer`]: it applies a local topology edit, asks for a minimisation,
//! reads back coordinates and energy, and reverts the edit if the move is
//! rejected. A self-contained harmonic implementation lives in
//! [`harmonic`]; production runs may wire in an external engine instead.

pub mod harmonic;

pub use harmonic::{HarmonicParams, HarmonicRelaxer};

use nalgebra::Point2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelaxError {
    #[error("Bond {i}-{j} not found in the relaxer's bond list")]
    UnknownBond { i: usize, j: usize },

    #[error("Angle {i}-{j}-{k} not found in the relaxer's angle list")]
    UnknownAngle { i: usize, j: usize, k: usize },

    #[error("Coordinate buffer holds {got} values, expected {expected}")]
    CoordinateCount { expected: usize, got: usize },
}

/// Optimiser exit status, mirroring the external engine's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxStatus {
    /// 0: converged to the force tolerance.
    Converged,
    /// 1: the starting point was already a zero-force point.
    ZeroForce,
    /// 2: iteration limit exceeded before convergence.
    IterationLimit,
    /// 3: infeasible (overlapping geometry detected before optimising).
    Infeasible,
    /// 4: non-convex arrangement rejected before optimising.
    NonConvex,
}

impl RelaxStatus {
    pub fn code(self) -> i32 {
        match self {
            RelaxStatus::Converged => 0,
            RelaxStatus::ZeroForce => 1,
            RelaxStatus::IterationLimit => 2,
            RelaxStatus::Infeasible => 3,
            RelaxStatus::NonConvex => 4,
        }
    }

    /// Whether the produced geometry is usable for validation and
    /// acceptance. Anything else forces rejection of the move.
    pub fn is_usable(self) -> bool {
        matches!(self, RelaxStatus::Converged | RelaxStatus::ZeroForce)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Relaxation {
    pub status: RelaxStatus,
    pub iterations: usize,
}

/// A local topology edit expressed in the relaxer's vocabulary: harmonic
/// bond and angle terms to drop and add, plus initial-guess displacements
/// for re-homed atoms. Angle triples are (end, centre, end).
#[derive(Debug, Clone, Default)]
pub struct LocalEdit {
    pub bond_breaks: Vec<(usize, usize)>,
    pub bond_makes: Vec<(usize, usize)>,
    pub angle_breaks: Vec<(usize, usize, usize)>,
    pub angle_makes: Vec<(usize, usize, usize)>,
    pub displacements: Vec<(usize, Point2<f64>)>,
}

pub trait Relaxer {
    /// Runs the minimisation from the current coordinates.
    fn minimise(&mut self) -> Result<Relaxation, RelaxError>;

    /// Flat `[x0, y0, x1, y1, ..]` view of the current coordinates.
    fn coordinates(&self) -> &[f64];

    fn set_coordinates(&mut self, coords: &[f64]) -> Result<(), RelaxError>;

    /// Applies a local edit (bond/angle terms and initial displacements).
    fn apply_local_edit(&mut self, edit: &LocalEdit) -> Result<(), RelaxError>;

    /// Reverts a previously applied local edit. Coordinates are *not*
    /// restored; the caller re-sets them from its own saved buffer.
    fn revert_local_edit(&mut self, edit: &LocalEdit) -> Result<(), RelaxError>;

    fn potential_energy(&self) -> f64;
}
