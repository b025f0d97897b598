//! Sidecar manifest describing a written snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cied_model::{CanonicalColumn, canonical_columns};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    Parquet,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub created_at: DateTime<Utc>,
    pub source: Option<PathBuf>,
    /// SHA-256 of the source export, lowercase hex.
    pub source_sha256: Option<String>,
    pub rows: usize,
    pub columns: Vec<CanonicalColumn>,
    pub formats: Vec<SnapshotFormat>,
}

impl DatasetManifest {
    pub fn new(rows: usize, source: Option<PathBuf>, source_sha256: Option<String>) -> Self {
        Self {
            created_at: Utc::now(),
            source,
            source_sha256,
            rows,
            columns: canonical_columns(),
            formats: Vec::new(),
        }
    }

    pub fn has_format(&self, format: SnapshotFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| StoreError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}
