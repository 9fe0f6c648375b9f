use latmc::core::io::IoError;
use latmc::engine::config::ConfigError;
use latmc::engine::error::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lattice file error: {0}")]
    Lattice(#[from] IoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
