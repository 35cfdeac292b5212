//! Error types for loading the source tables.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load one of the source tables. Fatal for that load: no
/// partial rows are ever returned alongside it.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}: malformed record at line {line}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("{}: invalid value at line {line}: {reason}", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{}: duplicate state '{state}'", path.display())]
    DuplicateState { path: PathBuf, state: String },
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
