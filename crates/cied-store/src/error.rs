//! Dataset store error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be written or read.
    #[error("{format} snapshot {path}: {message}")]
    Snapshot {
        format: &'static str,
        path: PathBuf,
        message: String,
    },

    /// Neither snapshot exists.
    #[error("no canonical dataset found (looked for {parquet} and {csv})")]
    NotFound { parquet: PathBuf, csv: PathBuf },

    /// Manifest could not be encoded or decoded.
    #[error("manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for StoreError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
