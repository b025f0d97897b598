//! Error types for the feature builder.

use thiserror::Error;

/// Structural failures while assembling the canonical frame.
///
/// Field-level problems are repaired, never reported here.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
