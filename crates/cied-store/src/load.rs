//! Snapshot loading with parquet preference and CSV fallback.

use std::fs::File;
use std::path::Path;

use cied_model::{ColumnKind, canonical_columns};
use polars::prelude::{CsvReadOptions, DataFrame, DataType, ParquetReader, SerReader};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::manifest::{DatasetManifest, SnapshotFormat};
use crate::write::DatasetPaths;

/// A loaded canonical frame and the snapshot it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub df: DataFrame,
    pub format: SnapshotFormat,
}

fn dtype_for(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Flag | ColumnKind::Count => DataType::Int32,
        ColumnKind::Float | ColumnKind::Code => DataType::Float64,
        ColumnKind::Category => DataType::String,
    }
}

/// Casts every canonical column present in `df` to its canonical dtype.
///
/// Columns outside the canonical schema are left untouched.
pub fn conform_to_schema(mut df: DataFrame) -> Result<DataFrame> {
    for column in canonical_columns() {
        let target = dtype_for(column.kind);
        let Ok(current) = df.column(&column.name) else {
            debug!(column = %column.name, "canonical column missing from snapshot");
            continue;
        };
        if current.dtype() == &target {
            continue;
        }
        // Integers stored as text or floats go through Float64 first.
        let cast = if target == DataType::Int32 && current.dtype() == &DataType::String {
            current.cast(&DataType::Float64)?.cast(&target)?
        } else {
            current.cast(&target)?
        };
        df.with_column(cast)?;
    }
    Ok(df)
}

fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        operation: "open",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let snapshot_error = |message: String| StoreError::Snapshot {
        format: "CSV",
        path: path.to_path_buf(),
        message,
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| snapshot_error(e.to_string()))?
        .finish()
        .map_err(|e| snapshot_error(e.to_string()))
}

/// False when the manifest says the last run wrote no parquet snapshot.
///
/// A missing or unreadable manifest trusts the parquet file.
fn parquet_is_current(paths: &DatasetPaths) -> bool {
    if !paths.manifest.exists() {
        return true;
    }
    match DatasetManifest::read(&paths.manifest) {
        Ok(manifest) if !manifest.has_format(SnapshotFormat::Parquet) => {
            warn!(
                path = %paths.parquet.display(),
                "parquet snapshot predates the last run; reading CSV"
            );
            false
        }
        Ok(_) => true,
        Err(err) => {
            debug!(error = %err, "manifest unreadable");
            true
        }
    }
}

/// Loads the canonical dataset.
///
/// The parquet snapshot is preferred; the CSV snapshot is used when the
/// parquet file is absent, unreadable or not written by the last run. Both
/// paths yield the same dtypes.
pub fn load_canonical(paths: &DatasetPaths) -> Result<LoadedDataset> {
    if paths.parquet.exists() && parquet_is_current(paths) {
        match read_parquet(&paths.parquet) {
            Ok(df) => {
                info!(path = %paths.parquet.display(), rows = df.height(), "loaded parquet snapshot");
                return Ok(LoadedDataset {
                    df: conform_to_schema(df)?,
                    format: SnapshotFormat::Parquet,
                });
            }
            Err(err) => {
                warn!(
                    path = %paths.parquet.display(),
                    error = %err,
                    "parquet snapshot unreadable; falling back to CSV"
                );
            }
        }
    }

    if !paths.csv.exists() {
        return Err(StoreError::NotFound {
            parquet: paths.parquet.clone(),
            csv: paths.csv.clone(),
        });
    }
    let df = read_csv(&paths.csv)?;
    info!(path = %paths.csv.display(), rows = df.height(), "loaded CSV snapshot");
    Ok(LoadedDataset {
        df: conform_to_schema(df)?,
        format: SnapshotFormat::Csv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom, Series};

    #[test]
    fn conform_casts_text_columns() {
        let df = DataFrame::new(vec![
            Column::from(Series::new("sex_male".into(), &["1", "0"])),
            Column::from(Series::new("age".into(), &[Some("63.5"), None])),
            Column::from(Series::new("extra".into(), &["x", "y"])),
        ])
        .unwrap();
        let df = conform_to_schema(df).unwrap();
        assert_eq!(df.column("sex_male").unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("extra").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn missing_snapshots_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_canonical(&DatasetPaths::in_dir(dir.path()));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
