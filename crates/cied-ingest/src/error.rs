//! Error types for raw table ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures while loading the source spreadsheet.
///
/// Malformed cell values are never errors; they load as null or text and
/// are repaired downstream.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file not found.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not one of the supported spreadsheet formats.
    #[error("unsupported source format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Workbook could not be opened or its first sheet read.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Workbook has no worksheets.
    #[error("workbook has no worksheets: {path}")]
    NoWorksheet { path: PathBuf },

    /// Failed to parse delimited text.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// First row is missing or every header cell is blank.
    #[error("could not detect header row in {path}")]
    NoHeaderDetected { path: PathBuf },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::UnsupportedFormat {
            path: PathBuf::from("/data/export.json"),
            extension: "json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported source format 'json' for /data/export.json"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
