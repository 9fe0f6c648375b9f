use crate::cli::RunArgs;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use latmc::core::io::fixed_rings::load_fixed_rings;
use latmc::engine::config::SimulationConfig;
use latmc::engine::context::LinkedLattice;
use latmc::engine::progress::ProgressReporter;
use latmc::engine::relax::{HarmonicParams, HarmonicRelaxer};
use latmc::workflows;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }

    let mut lattice = match &args.input {
        Some(prefix) => {
            info!("Loading lattice pair from prefix {:?}", prefix);
            LinkedLattice::from_files(prefix, &config)?
        }
        None => {
            info!(
                "Building a {}x{} hexagonal crystal",
                config.ring_rows, config.ring_cols
            );
            LinkedLattice::from_crystal(&config)?
        }
    };
    if let Some(path) = &args.fixed_rings {
        let rings = load_fixed_rings(path)?;
        info!("Holding {} ring(s) fixed", rings.len());
        lattice = lattice.with_fixed_rings(rings);
    }

    let mut relaxer = HarmonicRelaxer::from_lattice(&lattice, HarmonicParams::default());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting annealing run...");
    info!("Invoking the core annealing workflow...");
    let outcome = workflows::anneal::run(
        &mut lattice,
        &mut relaxer,
        &config,
        &reporter,
        args.checkpoint.as_deref(),
    )?;

    lattice.write(&args.output)?;

    let c = outcome.counters;
    println!(
        "✓ Annealing complete: {}/{} moves accepted ({:.1}%), final energy {:.4}.",
        c.accepted,
        c.attempted,
        100.0 * c.acceptance_rate(),
        outcome.final_energy
    );
    println!(
        "  Rejections: {} energy, {} bond length, {} angle, {} relaxation.",
        c.rejected_energy, c.rejected_bond_length, c.rejected_angle, c.rejected_relaxation
    );
    println!(
        "  Final lattice pair written to: {}_A_*.dat / {}_B_*.dat",
        args.output.display(),
        args.output.display()
    );
    Ok(())
}
