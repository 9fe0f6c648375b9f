use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Materials Simulation Group",
    version,
    about = "LatMC CLI - Monte Carlo evolution of two-dimensional network materials by bond switching and mixing.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the annealing workflow on a lattice pair.
    Run(RunArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the simulation configuration file in TOML format.
    /// Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path prefix of an existing lattice pair ({prefix}_A_*.dat and
    /// {prefix}_B_*.dat). A pristine hexagonal crystal of the configured
    /// size is built when omitted.
    #[arg(short, long, value_name = "PREFIX")]
    pub input: Option<PathBuf>,

    /// Path prefix for the final lattice pair.
    #[arg(short, long, required = true, value_name = "PREFIX")]
    pub output: PathBuf,

    /// Path to a file of ring IDs to hold fixed, one per line.
    #[arg(long, value_name = "PATH")]
    pub fixed_rings: Option<PathBuf>,

    /// Path prefix for a rolling checkpoint written after each stage.
    #[arg(long, value_name = "PREFIX")]
    pub checkpoint: Option<PathBuf>,

    /// Override the random seed from the config file.
    #[arg(short, long, value_name = "INT")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_an_output_prefix() {
        assert!(Cli::try_parse_from(["latmc", "run"]).is_err());
        let cli = Cli::try_parse_from(["latmc", "run", "--output", "out/run1"]).unwrap();
        let Commands::Run(args) = cli.command;
        assert_eq!(args.output, PathBuf::from("out/run1"));
        assert!(args.config.is_none());
        assert!(args.input.is_none());
    }

    #[test]
    fn global_flags_parse_before_and_after_the_subcommand() {
        let cli = Cli::try_parse_from(["latmc", "-vv", "run", "-o", "x", "--seed", "9"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command;
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["latmc", "-v", "-q", "run", "-o", "x"]).is_err());
    }
}
