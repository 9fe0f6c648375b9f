//! Stderr and optional file logging for the `latmc` binary.

use crate::error::Result;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Maps `-v` counts to a level, with `--quiet` silencing everything.
fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: a compact layer on stderr, plus a
/// plain-text layer into `log_file` when one is given.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(stderr_layer);

    match log_file {
        Some(path) => {
            let file_layer = fmt::layer()
                .with_writer(File::create(&path)?)
                .with_ansi(false)
                .with_target(true);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info};

    static GLOBAL: Once = Once::new();

    fn install_global() {
        GLOBAL.call_once(|| setup_logging(3, false, None).unwrap());
    }

    #[test]
    fn verbosity_ladder_maps_to_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(9, false), LevelFilter::TRACE);
        assert_eq!(level_for(2, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn events_flow_through_the_installed_subscriber() {
        install_global();
        info!(stage = "test", "events reach the subscriber");
        debug!("debug events too");
    }

    #[test]
    #[serial]
    fn file_layer_records_events_as_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let layer = fmt::layer()
            .with_writer(File::create(&path).unwrap())
            .with_ansi(false);
        let scoped = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(scoped, || {
            tracing::warn!("written to the run log");
        });
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("written to the run log"));
        assert!(content.contains("WARN"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn directory_as_log_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(dir.path().to_path_buf()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
