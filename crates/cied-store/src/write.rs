//! Snapshot writing.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter};
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::hash::compute_file_hash;
use crate::manifest::{DatasetManifest, SnapshotFormat};

/// File locations of one canonical dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub parquet: PathBuf,
    pub csv: PathBuf,
    pub manifest: PathBuf,
}

impl DatasetPaths {
    /// `clean.parquet`, `clean.csv` and `clean.manifest.json` in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            parquet: dir.join("clean.parquet"),
            csv: dir.join("clean.csv"),
            manifest: dir.join("clean.manifest.json"),
        }
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes through a temp file and renames it into place.
fn write_atomic<F>(format: &'static str, path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> std::result::Result<(), String>,
{
    create_parent(path)?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    let file = File::create(&temp_path).map_err(|source| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source,
    })?;
    if let Err(message) = write(file) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Snapshot {
            format,
            path: path.to_path_buf(),
            message,
        });
    }
    fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
        operation: "rename",
        path: temp_path.clone(),
        source,
    })
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    write_atomic("parquet", path, |file| {
        ParquetWriter::new(file)
            .finish(df)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    write_atomic("CSV", path, |mut file| {
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| e.to_string())
    })
}

/// Deletes a snapshot left by an earlier run so readers cannot prefer it
/// over this run's CSV.
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            warn!(path = %path.display(), "removed stale parquet snapshot");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            operation: "remove",
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists the canonical frame.
///
/// The parquet snapshot is attempted first; if it fails the failure is
/// logged, any parquet file from an earlier run is removed and the run
/// continues with the CSV snapshot only. A CSV failure is fatal.
pub fn save_canonical(
    df: &mut DataFrame,
    paths: &DatasetPaths,
    source: Option<&Path>,
) -> Result<DatasetManifest> {
    let source_sha256 = match source {
        Some(path) => match compute_file_hash(path) {
            Ok(hash) => Some(hash),
            Err(err) => {
                warn!(error = %err, "could not hash source file");
                None
            }
        },
        None => None,
    };
    let mut manifest =
        DatasetManifest::new(df.height(), source.map(Path::to_path_buf), source_sha256);

    match write_parquet(df, &paths.parquet) {
        Ok(()) => {
            manifest.formats.push(SnapshotFormat::Parquet);
            info!(path = %paths.parquet.display(), "wrote parquet snapshot");
        }
        Err(err) => {
            warn!(
                path = %paths.parquet.display(),
                error = %err,
                "parquet snapshot failed; continuing with CSV only"
            );
            remove_stale(&paths.parquet)?;
        }
    }

    write_csv(df, &paths.csv)?;
    manifest.formats.push(SnapshotFormat::Csv);
    info!(path = %paths.csv.display(), rows = df.height(), "wrote CSV snapshot");

    manifest.write(&paths.manifest)?;
    Ok(manifest)
}
