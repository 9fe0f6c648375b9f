//! The complete annealing procedure: thermalise hot, then step the
//! temperature down the configured log-scale ladder, running a block of
//! Monte Carlo moves at each rung.

use crate::engine::config::{MoveType, SimulationConfig};
use crate::engine::context::LinkedLattice;
use crate::engine::controller::{MoveController, MoveCounters};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::relax::Relaxer;
use crate::engine::selector;
use std::path::Path;
use tracing::info;

/// Tallies for one block of moves at a fixed temperature.
#[derive(Debug, Clone, Copy)]
pub struct StageReport {
    pub log10_temperature: f64,
    pub temperature: f64,
    pub counters: MoveCounters,
}

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub thermalisation: StageReport,
    pub stages: Vec<StageReport>,
    /// Totals over the whole run, thermalisation included.
    pub counters: MoveCounters,
    pub final_energy: f64,
}

/// Runs the full schedule. The lattice is audited after every stage, so a
/// corrupted move aborts the run at the stage boundary where it surfaced.
/// When `checkpoint_prefix` is set, the lattice pair is re-written there
/// after each stage as a rolling checkpoint.
pub fn run<R: Relaxer>(
    lattice: &mut LinkedLattice,
    relaxer: &mut R,
    config: &SimulationConfig,
    reporter: &ProgressReporter<'_>,
    checkpoint_prefix: Option<&Path>,
) -> Result<AnnealOutcome, EngineError> {
    // Settle the starting geometry before any move is attempted.
    relaxer.minimise()?;
    let coords = relaxer.coordinates().to_vec();
    lattice.push_coords(&coords)?;
    lattice.energy = relaxer.potential_energy();
    selector::update_weights(lattice);

    let mut controller = MoveController::new(config.random_seed, 0.0);
    let schedule = &config.temperature;

    let thermalisation = run_stage(
        lattice,
        relaxer,
        &mut controller,
        config,
        reporter,
        checkpoint_prefix,
        schedule.thermalisation_log10,
        schedule.thermalisation_steps,
    )?;
    info!(
        temperature = thermalisation.temperature,
        accepted = thermalisation.counters.accepted,
        "thermalisation complete"
    );

    let stage_count = if schedule.increment_log10 == 0.0 {
        1
    } else {
        let span = (schedule.end_log10 - schedule.start_log10) / schedule.increment_log10;
        if span < 0.0 { 1 } else { span.floor() as usize + 1 }
    };

    let mut stages = Vec::with_capacity(stage_count);
    for i in 0..stage_count {
        let log10_t = schedule.start_log10 + i as f64 * schedule.increment_log10;
        let report = run_stage(
            lattice,
            relaxer,
            &mut controller,
            config,
            reporter,
            checkpoint_prefix,
            log10_t,
            schedule.steps_per_temperature,
        )?;
        info!(
            temperature = report.temperature,
            accepted = report.counters.accepted,
            attempted = report.counters.attempted,
            energy = lattice.energy,
            "annealing stage complete"
        );
        stages.push(report);
    }

    Ok(AnnealOutcome {
        thermalisation,
        stages,
        counters: controller.counters,
        final_energy: lattice.energy,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_stage<R: Relaxer>(
    lattice: &mut LinkedLattice,
    relaxer: &mut R,
    controller: &mut MoveController,
    config: &SimulationConfig,
    reporter: &ProgressReporter<'_>,
    checkpoint_prefix: Option<&Path>,
    log10_temperature: f64,
    steps: usize,
) -> Result<StageReport, EngineError> {
    let temperature = 10f64.powf(log10_temperature);
    controller.set_temperature(temperature);
    reporter.report(Progress::StageStart {
        temperature,
        steps: steps as u64,
    });

    let before = controller.counters;
    for _ in 0..steps {
        let outcome = match config.move_type {
            MoveType::Switch => controller.execute_switch_move(lattice, relaxer)?,
            MoveType::Mix => controller.execute_mix_move(lattice, relaxer)?,
        };
        reporter.report(Progress::StepComplete {
            accepted: outcome.accepted,
        });
    }
    let after = controller.counters;

    lattice.check_consistency()?;
    if let Some(prefix) = checkpoint_prefix {
        lattice.write(prefix)?;
    }

    let counters = MoveCounters {
        attempted: after.attempted - before.attempted,
        accepted: after.accepted - before.accepted,
        rejected_energy: after.rejected_energy - before.rejected_energy,
        rejected_bond_length: after.rejected_bond_length - before.rejected_bond_length,
        rejected_angle: after.rejected_angle - before.rejected_angle,
        rejected_relaxation: after.rejected_relaxation - before.rejected_relaxation,
    };
    reporter.report(Progress::StageFinish {
        accepted: counters.accepted,
        attempted: counters.attempted,
    });
    Ok(StageReport {
        log10_temperature,
        temperature,
        counters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::TemperatureSchedule;
    use crate::engine::relax::{HarmonicParams, HarmonicRelaxer};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn test_config() -> SimulationConfig {
        SimulationConfig::builder()
            .temperature(TemperatureSchedule {
                start_log10: 4.0,
                end_log10: 3.0,
                increment_log10: -1.0,
                thermalisation_log10: 5.0,
                steps_per_temperature: 5,
                thermalisation_steps: 5,
            })
            .random_seed(17)
            .build()
            .unwrap()
    }

    #[test]
    fn schedule_runs_every_stage_and_stays_consistent() {
        let config = test_config();
        let mut lattice = LinkedLattice::from_crystal(&config).unwrap();
        let mut relaxer = HarmonicRelaxer::from_lattice(&lattice, HarmonicParams::default());
        let steps = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StepComplete { .. } = event {
                steps.fetch_add(1, Ordering::Relaxed);
            }
        }));
        let outcome = run(&mut lattice, &mut relaxer, &config, &reporter, None).unwrap();
        assert_eq!(outcome.stages.len(), 2);
        assert_eq!(outcome.counters.attempted, 15);
        assert_eq!(steps.load(Ordering::Relaxed), 15);
        assert_eq!(outcome.final_energy, lattice.energy);
        lattice.check_consistency().unwrap();
    }

    #[test]
    fn zero_increment_runs_a_single_stage() {
        let mut config = test_config();
        config.temperature.increment_log10 = 0.0;
        let mut lattice = LinkedLattice::from_crystal(&config).unwrap();
        let mut relaxer = HarmonicRelaxer::from_lattice(&lattice, HarmonicParams::default());
        let reporter = ProgressReporter::new();
        let outcome = run(&mut lattice, &mut relaxer, &config, &reporter, None).unwrap();
        assert_eq!(outcome.stages.len(), 1);
    }

    #[test]
    fn checkpoints_are_written_per_stage() {
        let config = test_config();
        let mut lattice = LinkedLattice::from_crystal(&config).unwrap();
        let mut relaxer = HarmonicRelaxer::from_lattice(&lattice, HarmonicParams::default());
        let reporter = ProgressReporter::new();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("check");
        run(&mut lattice, &mut relaxer, &config, &reporter, Some(&prefix)).unwrap();
        assert!(dir.path().join("check_A_info.dat").exists());
        assert!(dir.path().join("check_B_net.dat").exists());
    }
}
