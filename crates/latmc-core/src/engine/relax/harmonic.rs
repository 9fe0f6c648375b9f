//! Built-in harmonic relaxer: periodic harmonic bond and angle terms
//! minimised by fixed-step steepest descent. Good enough to drive the move
//! engine end to end without an external optimiser.

use super::{LocalEdit, RelaxError, Relaxation, RelaxStatus, Relaxer};
use crate::core::geometry;
use crate::engine::context::LinkedLattice;
use nalgebra::{Point2, Vector2};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy)]
pub struct HarmonicParams {
    pub bond_k: f64,
    pub bond_r0: f64,
    pub angle_k: f64,
    /// Rest angle for every three-body term (2pi/3 for honeycomb lattices).
    pub angle_theta0: f64,
    pub step_size: f64,
    pub force_tolerance: f64,
    pub max_iterations: usize,
    /// Bonded pairs closer than this before optimising are deemed
    /// overlapping and the minimisation refuses to start.
    pub overlap_distance: f64,
}

impl Default for HarmonicParams {
    fn default() -> Self {
        Self {
            bond_k: 1.0,
            bond_r0: 1.0,
            angle_k: 0.5,
            angle_theta0: TAU / 3.0,
            step_size: 0.02,
            force_tolerance: 1e-3,
            max_iterations: 5000,
            overlap_distance: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarmonicRelaxer {
    dimensions: Vector2<f64>,
    coords: Vec<f64>,
    bonds: Vec<(usize, usize)>,
    angles: Vec<(usize, usize, usize)>,
    params: HarmonicParams,
}

impl HarmonicRelaxer {
    pub fn new(
        dimensions: Vector2<f64>,
        coords: Vec<f64>,
        bonds: Vec<(usize, usize)>,
        angles: Vec<(usize, usize, usize)>,
        params: HarmonicParams,
    ) -> Self {
        Self {
            dimensions,
            coords,
            bonds,
            angles,
            params,
        }
    }

    /// Builds bond and angle term lists from the base lattice of a linked
    /// pair: one bond per network edge, one angle per consecutive
    /// neighbour pair around each node.
    pub fn from_lattice(lattice: &LinkedLattice, params: HarmonicParams) -> Self {
        let base = &lattice.network_a;
        let mut bonds = Vec::new();
        let mut angles = Vec::new();
        for node in &base.nodes {
            for &neighbour in &node.net_cnxs {
                if node.id < neighbour {
                    bonds.push((node.id, neighbour));
                }
            }
            angles.extend(crate::engine::switch::cyclic_angles_at(base, node.id));
        }
        Self::new(
            lattice.dimensions,
            lattice.current_coords.clone(),
            bonds,
            angles,
            params,
        )
    }

    fn point(&self, id: usize) -> Point2<f64> {
        Point2::new(self.coords[2 * id], self.coords[2 * id + 1])
    }

    fn accumulate_gradient(&self, gradient: &mut [f64]) {
        let dims = &self.dimensions;
        for &(i, j) in &self.bonds {
            let v = geometry::pbc_vector(&self.point(i), &self.point(j), dims);
            let r = v.norm();
            if r < 1e-12 {
                continue;
            }
            let pull = self.params.bond_k * (r - self.params.bond_r0) / r;
            gradient[2 * i] -= pull * v.x;
            gradient[2 * i + 1] -= pull * v.y;
            gradient[2 * j] += pull * v.x;
            gradient[2 * j + 1] += pull * v.y;
        }
        for &(a, c, b) in &self.angles {
            let u = geometry::pbc_vector(&self.point(c), &self.point(a), dims);
            let v = geometry::pbc_vector(&self.point(c), &self.point(b), dims);
            let (nu, nv) = (u.norm(), v.norm());
            if nu < 1e-12 || nv < 1e-12 {
                continue;
            }
            let (uh, vh) = (u / nu, v / nv);
            let cos = uh.dot(&vh).clamp(-1.0, 1.0);
            let sin = (1.0 - cos * cos).sqrt();
            if sin < 1e-8 {
                continue;
            }
            let theta = cos.acos();
            let coeff = self.params.angle_k * (theta - self.params.angle_theta0);
            let da = (uh * cos - vh) / (nu * sin);
            let db = (vh * cos - uh) / (nv * sin);
            let dc = -(da + db);
            for (id, d) in [(a, da), (b, db), (c, dc)] {
                gradient[2 * id] += coeff * d.x;
                gradient[2 * id + 1] += coeff * d.y;
            }
        }
    }

    /// Edits the term lists all-or-nothing: every break is resolved to a
    /// position before either list is touched, so an unknown term leaves
    /// the relaxer exactly as it was.
    fn edit_terms(
        &mut self,
        bond_breaks: &[(usize, usize)],
        bond_makes: &[(usize, usize)],
        angle_breaks: &[(usize, usize, usize)],
        angle_makes: &[(usize, usize, usize)],
    ) -> Result<(), RelaxError> {
        let mut bond_hits: Vec<usize> = Vec::with_capacity(bond_breaks.len());
        for &(i, j) in bond_breaks {
            let hit = self
                .bonds
                .iter()
                .enumerate()
                .find(|&(idx, &(a, b))| {
                    !bond_hits.contains(&idx) && ((a, b) == (i, j) || (a, b) == (j, i))
                })
                .map(|(idx, _)| idx)
                .ok_or(RelaxError::UnknownBond { i, j })?;
            bond_hits.push(hit);
        }
        let mut angle_hits: Vec<usize> = Vec::with_capacity(angle_breaks.len());
        for &(i, j, k) in angle_breaks {
            let hit = self
                .angles
                .iter()
                .enumerate()
                .find(|&(idx, &(a, c, b))| {
                    !angle_hits.contains(&idx)
                        && c == j
                        && ((a, b) == (i, k) || (a, b) == (k, i))
                })
                .map(|(idx, _)| idx)
                .ok_or(RelaxError::UnknownAngle { i, j, k })?;
            angle_hits.push(hit);
        }
        // Highest index first keeps the remaining hits valid under
        // swap_remove.
        bond_hits.sort_unstable_by(|a, b| b.cmp(a));
        for idx in bond_hits {
            self.bonds.swap_remove(idx);
        }
        angle_hits.sort_unstable_by(|a, b| b.cmp(a));
        for idx in angle_hits {
            self.angles.swap_remove(idx);
        }
        self.bonds.extend_from_slice(bond_makes);
        self.angles.extend_from_slice(angle_makes);
        Ok(())
    }
}

impl Relaxer for HarmonicRelaxer {
    fn minimise(&mut self) -> Result<Relaxation, RelaxError> {
        for &(i, j) in &self.bonds {
            let d = geometry::pbc_distance(&self.point(i), &self.point(j), &self.dimensions);
            if d < self.params.overlap_distance {
                return Ok(Relaxation {
                    status: RelaxStatus::Infeasible,
                    iterations: 0,
                });
            }
        }
        let mut gradient = vec![0.0; self.coords.len()];
        for iteration in 0..self.params.max_iterations {
            gradient.fill(0.0);
            self.accumulate_gradient(&mut gradient);
            let max_force = gradient.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if max_force < self.params.force_tolerance {
                let status = if iteration == 0 {
                    RelaxStatus::ZeroForce
                } else {
                    RelaxStatus::Converged
                };
                return Ok(Relaxation {
                    status,
                    iterations: iteration,
                });
            }
            for (coord, g) in self.coords.iter_mut().zip(&gradient) {
                *coord -= self.params.step_size * g;
            }
            geometry::wrap_coordinates(&mut self.coords, &self.dimensions);
        }
        Ok(Relaxation {
            status: RelaxStatus::IterationLimit,
            iterations: self.params.max_iterations,
        })
    }

    fn coordinates(&self) -> &[f64] {
        &self.coords
    }

    fn set_coordinates(&mut self, coords: &[f64]) -> Result<(), RelaxError> {
        if coords.len() != self.coords.len() {
            return Err(RelaxError::CoordinateCount {
                expected: self.coords.len(),
                got: coords.len(),
            });
        }
        self.coords.copy_from_slice(coords);
        Ok(())
    }

    fn apply_local_edit(&mut self, edit: &LocalEdit) -> Result<(), RelaxError> {
        self.edit_terms(
            &edit.bond_breaks,
            &edit.bond_makes,
            &edit.angle_breaks,
            &edit.angle_makes,
        )?;
        for &(id, point) in &edit.displacements {
            let wrapped = geometry::wrap_point(&point, &self.dimensions);
            self.coords[2 * id] = wrapped.x;
            self.coords[2 * id + 1] = wrapped.y;
        }
        Ok(())
    }

    fn revert_local_edit(&mut self, edit: &LocalEdit) -> Result<(), RelaxError> {
        self.edit_terms(
            &edit.bond_makes,
            &edit.bond_breaks,
            &edit.angle_makes,
            &edit.angle_breaks,
        )
    }

    fn potential_energy(&self) -> f64 {
        let dims = &self.dimensions;
        let mut energy = 0.0;
        for &(i, j) in &self.bonds {
            let r = geometry::pbc_distance(&self.point(i), &self.point(j), dims);
            energy += 0.5 * self.params.bond_k * (r - self.params.bond_r0).powi(2);
        }
        for &(a, c, b) in &self.angles {
            let u = geometry::pbc_vector(&self.point(c), &self.point(a), dims);
            let v = geometry::pbc_vector(&self.point(c), &self.point(b), dims);
            if u.norm() < 1e-12 || v.norm() < 1e-12 {
                continue;
            }
            let cos = (u.dot(&v) / (u.norm() * v.norm())).clamp(-1.0, 1.0);
            let theta = cos.acos();
            energy += 0.5 * self.params.angle_k * (theta - self.params.angle_theta0).powi(2);
        }
        energy
    }
}
