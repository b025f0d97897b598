//! Raw table ingestion for the CIED MRI export.
//!
//! Reads the source spreadsheet (`.xlsx`/`.xls`/`.ods` via calamine or
//! `.csv`) into a [`RawTable`]. Duplicate header names are disambiguated
//! with `.1`, `.2` suffixes, which is how the per-sequence column groups
//! of the export are told apart.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cied_ingest::load_raw_table;
//!
//! let table = load_raw_table(Path::new("data/CIED_MRI.xlsx"))?;
//! let age = table.series("Age");
//! ```

mod error;
mod header;
mod reader;
mod table;

// === Error Types ===
pub use error::{IngestError, Result};

// === Loading ===
pub use reader::{SourceFormat, load_raw_table};
pub use table::{RawCell, RawTable};

// === Header Handling ===
pub use header::{mangle_headers, normalize_header};
