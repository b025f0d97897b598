//! Canonical dataset store.
//!
//! Each prep run writes the canonical frame twice: a parquet snapshot that
//! keeps per-column dtypes, and a CSV snapshot that is always written for
//! portability. A JSON manifest records row count, column kinds, source
//! hash and which snapshots were written.
//!
//! Readers call [`load_canonical`], which prefers parquet and falls back to
//! CSV; both paths return the canonical dtypes.

mod error;
mod hash;
mod load;
mod manifest;
mod write;

pub use error::{Result, StoreError};
pub use hash::compute_file_hash;
pub use load::{LoadedDataset, conform_to_schema, load_canonical};
pub use manifest::{DatasetManifest, SnapshotFormat};
pub use write::{DatasetPaths, save_canonical};
