//! Model fitting errors.

use thiserror::Error;

/// Why a single model could not be fitted or evaluated.
///
/// These are per-attempt failures: callers record them and move on to the
/// next model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("column '{variable}' not found in dataset")]
    MissingColumn { variable: String },

    #[error("variable '{variable}' is not numeric")]
    NonNumeric { variable: String },

    #[error("no complete rows for the model")]
    EmptyDesign,

    #[error("{rows} complete rows for {parameters} parameters")]
    TooFewRows { rows: usize, parameters: usize },

    #[error("outcome '{outcome}' is constant")]
    ConstantOutcome { outcome: String },

    #[error("outcome '{outcome}' has values other than 0 and 1")]
    NonBinaryOutcome { outcome: String },

    #[error("singular information matrix (collinear design columns)")]
    Singular,

    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("perfect separation detected")]
    PerfectSeparation,

    #[error("level '{level}' of '{variable}' was not seen during fitting")]
    UnknownLevel { variable: String, level: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for FitError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FitError>;
