//! Report stage errors.

use std::path::PathBuf;

use cied_stats::FitError;
use thiserror::Error;

/// Structural failures that stop a stage.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render figure {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("failed to write attempt log {path}: {source}")]
    AttemptLog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for ReportError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Why one attempt inside a stage failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
