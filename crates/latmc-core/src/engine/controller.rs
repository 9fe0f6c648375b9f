//! Driving one Monte Carlo move end to end: select, generate, mutate,
//! relax, validate, then commit or roll back.
//!
//! The controller owns the selection RNG and the Metropolis criterion, and
//! tallies why moves fail. Rejected moves leave the lattice, the relaxer's
//! term lists, and the coordinate buffer exactly as they were.

use crate::core::geometry;
use crate::engine::context::LinkedLattice;
use crate::engine::error::EngineError;
use crate::engine::metropolis::Metropolis;
use crate::engine::mutate::{self, TopologySnapshot};
use crate::engine::relax::{LocalEdit, RelaxStatus, Relaxer};
use crate::engine::selector::{self, Candidate};
use crate::engine::switch::{self, Angle, LatticeEdit};
use crate::engine::validate;
use nalgebra::Point2;
use std::collections::HashMap;
use tracing::debug;

/// Running tallies over every attempted move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveCounters {
    pub attempted: u64,
    pub accepted: u64,
    pub rejected_energy: u64,
    pub rejected_bond_length: u64,
    pub rejected_angle: u64,
    pub rejected_relaxation: u64,
}

impl MoveCounters {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoveOutcome {
    pub accepted: bool,
    pub status: RelaxStatus,
    pub iterations: usize,
}

#[derive(Debug)]
enum RejectReason {
    Relaxation,
    BondLength,
    Angle,
    Energy,
}

pub struct MoveController {
    rng: rand::rngs::StdRng,
    metropolis: Metropolis,
    pub counters: MoveCounters,
}

impl MoveController {
    pub fn new(seed: u64, temperature: f64) -> Self {
        use rand::SeedableRng;
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            metropolis: Metropolis::new(seed.wrapping_add(1), temperature),
            counters: MoveCounters::default(),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.metropolis.temperature()
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.metropolis.set_temperature(temperature);
    }

    pub fn execute_switch_move<R: Relaxer>(
        &mut self,
        lattice: &mut LinkedLattice,
        relaxer: &mut R,
    ) -> Result<MoveOutcome, EngineError> {
        self.attempt(lattice, relaxer, switch::gen_switch_operations)
    }

    pub fn execute_mix_move<R: Relaxer>(
        &mut self,
        lattice: &mut LinkedLattice,
        relaxer: &mut R,
    ) -> Result<MoveOutcome, EngineError> {
        self.attempt(lattice, relaxer, switch::gen_mix_operations)
    }

    fn attempt<R: Relaxer>(
        &mut self,
        lattice: &mut LinkedLattice,
        relaxer: &mut R,
        generate: fn(&LinkedLattice, Candidate) -> Result<Option<LatticeEdit>, EngineError>,
    ) -> Result<MoveOutcome, EngineError> {
        self.counters.attempted += 1;

        // One quadratic budget covers both failure modes: draws that land
        // on frozen or isolated nodes and candidates the generator rejects
        // as degenerate.
        let budget = lattice.network_a.nodes.len().pow(2);
        let table = selector::weight_table(lattice)?;
        let mut edit = None;
        for _ in 0..budget {
            let Some(candidate) = selector::try_pick_connection(lattice, &table, &mut self.rng)?
            else {
                continue;
            };
            if let Some(generated) = generate(lattice, candidate)? {
                edit = Some(generated);
                break;
            }
        }
        let mut edit = edit.ok_or(EngineError::SelectionExhausted { attempts: budget })?;

        // A switch seeds the relaxation with the moved bond rotated a
        // quarter turn about its midpoint, in the winding sense of the four
        // surrounding rings.
        if let (Some(rings), Some((p, q))) = (edit.wind_rings, edit.rotation_bond) {
            let points: Vec<Point2<f64>> = rings
                .iter()
                .map(|&r| lattice.network_b.nodes[r].coord)
                .collect();
            let winding = geometry::path_winding(&points, &lattice.dimensions);
            let (guess_p, guess_q) = geometry::rotate_about_midpoint(
                &lattice.coord_a(p),
                &lattice.coord_a(q),
                winding,
            );
            edit.local.displacements = vec![(p, guess_p), (q, guess_q)];
        }

        let terms_before = stored_angle_terms(lattice, &edit.involved_nodes);
        let snapshot = TopologySnapshot::capture(lattice, &edit);
        let saved_coords = lattice.current_coords.clone();
        let initial_energy = lattice.energy;

        // A fatal error past this point must not leave a half-applied
        // move behind.
        if let Err(error) = mutate::apply_edit(lattice, &edit) {
            snapshot.restore(lattice);
            return Err(error);
        }
        // Term edits are all-or-nothing and displacements follow them, so
        // a failure here leaves the relaxer untouched.
        if let Err(error) = relaxer.apply_local_edit(&edit.local) {
            snapshot.restore(lattice);
            return Err(error.into());
        }
        let relaxation = match relaxer.minimise() {
            Ok(relaxation) => relaxation,
            Err(error) => {
                relaxer.revert_local_edit(&edit.local)?;
                relaxer.set_coordinates(&saved_coords)?;
                snapshot.restore(lattice);
                return Err(error.into());
            }
        };

        let verdict = if !relaxation.status.is_usable() {
            Err(RejectReason::Relaxation)
        } else {
            let coords = relaxer.coordinates();
            if !validate::check_bond_lengths(lattice, &edit.involved_nodes, coords) {
                Err(RejectReason::BondLength)
            } else if !validate::check_angles_within_range(lattice, &edit.angle_check_nodes, coords)
            {
                Err(RejectReason::Angle)
            } else if lattice.maintain_convexity
                && !validate::check_convexity(lattice, &edit.touched_b, coords)
            {
                Err(RejectReason::Angle)
            } else {
                let final_energy = relaxer.potential_energy();
                if self.metropolis.accept(final_energy, initial_energy) {
                    Ok(final_energy)
                } else {
                    Err(RejectReason::Energy)
                }
            }
        };

        match verdict {
            Ok(final_energy) => {
                let coords = relaxer.coordinates().to_vec();
                lattice.push_coords(&coords)?;
                for &id in &edit.involved_nodes {
                    lattice.arrange_neighbours_clockwise(id, &coords);
                }
                realign_angle_terms(lattice, relaxer, &edit, terms_before)?;
                lattice.energy = final_energy;
                selector::update_weights(lattice);
                self.counters.accepted += 1;
                debug!(
                    energy = final_energy,
                    iterations = relaxation.iterations,
                    "move accepted"
                );
                Ok(MoveOutcome {
                    accepted: true,
                    status: relaxation.status,
                    iterations: relaxation.iterations,
                })
            }
            Err(reason) => {
                relaxer.revert_local_edit(&edit.local)?;
                relaxer.set_coordinates(&saved_coords)?;
                snapshot.restore(lattice);
                debug!(reason = ?reason, "move rejected");
                match reason {
                    RejectReason::Relaxation => self.counters.rejected_relaxation += 1,
                    RejectReason::BondLength => self.counters.rejected_bond_length += 1,
                    RejectReason::Angle => self.counters.rejected_angle += 1,
                    RejectReason::Energy => self.counters.rejected_energy += 1,
                }
                Ok(MoveOutcome {
                    accepted: false,
                    status: relaxation.status,
                    iterations: relaxation.iterations,
                })
            }
        }
    }
}

/// Ends-normalised angle key, so `(i, j, k)` and `(k, j, i)` compare equal.
fn normalise(angle: Angle) -> Angle {
    let (i, j, k) = angle;
    if i <= k { (i, j, k) } else { (k, j, i) }
}

fn stored_angle_terms(lattice: &LinkedLattice, ids: &[usize]) -> HashMap<usize, Vec<Angle>> {
    ids.iter()
        .map(|&id| {
            let terms = switch::cyclic_angles_at(&lattice.network_a, id)
                .into_iter()
                .map(normalise)
                .collect();
            (id, terms)
        })
        .collect()
}

fn remove_one(terms: &mut Vec<Angle>, angle: Angle) {
    if let Some(position) = terms.iter().position(|&t| t == angle) {
        terms.swap_remove(position);
    }
}

/// After a commit re-sorts the stored neighbour lists, the relaxer's angle
/// terms at four-coordinated nodes can disagree with the new cyclic pairs.
/// This diffs the relaxer's post-edit terms against the re-sorted lists and
/// applies the correction. On three-coordinated lattices the diff is empty.
fn realign_angle_terms<R: Relaxer>(
    lattice: &LinkedLattice,
    relaxer: &mut R,
    edit: &LatticeEdit,
    terms_before: HashMap<usize, Vec<Angle>>,
) -> Result<(), EngineError> {
    // Reconstruct the terms the relaxer holds now: the pre-move terms with
    // the edit's breaks and makes folded in.
    let mut held = terms_before;
    for &angle in &edit.local.angle_breaks {
        if let Some(terms) = held.get_mut(&angle.1) {
            remove_one(terms, normalise(angle));
        }
    }
    for &angle in &edit.local.angle_makes {
        if let Some(terms) = held.get_mut(&angle.1) {
            terms.push(normalise(angle));
        }
    }

    let mut correction = LocalEdit::default();
    for &id in &edit.involved_nodes {
        let mut wanted: Vec<Angle> = switch::cyclic_angles_at(&lattice.network_a, id)
            .into_iter()
            .map(normalise)
            .collect();
        let mut current = held.remove(&id).unwrap_or_default();
        // Cancel the overlap; what remains on each side is the diff.
        let mut i = 0;
        while i < current.len() {
            if let Some(j) = wanted.iter().position(|&w| w == current[i]) {
                wanted.swap_remove(j);
                current.swap_remove(i);
            } else {
                i += 1;
            }
        }
        correction.angle_breaks.extend(current);
        correction.angle_makes.extend(wanted);
    }
    if !correction.angle_breaks.is_empty() || !correction.angle_makes.is_empty() {
        relaxer.apply_local_edit(&correction)?;
    }
    Ok(())
}
