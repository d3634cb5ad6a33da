use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the digest library.
///
/// Malformed fields never show up here: the decoder maps them to absent
/// values. Everything in this enum is fatal to the invocation.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("failed to open input '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input: {0}")]
    Read(#[from] csv::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("aggregation worker {0} terminated unexpectedly")]
    Worker(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load previous summary '{}': {message}", path.display())]
    Previous { path: PathBuf, message: String },
}

pub type Result<T, E = DigestError> = std::result::Result<T, E>;
