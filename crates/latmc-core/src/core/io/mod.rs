//! Plain-text persistence: lattice file triplets keyed by a path prefix and
//! the fixed-ring list.

pub mod fixed_rings;
pub mod lattice;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error on {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path} line {line}: {message}", path = path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(
        "File {path} holds {got} records but the network has {expected} nodes",
        path = path.display()
    )]
    RecordCount {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("Node reference {id} out of range (network has {count} nodes) in {path}", path = path.display())]
    NodeOutOfRange {
        path: PathBuf,
        id: usize,
        count: usize,
    },
}
