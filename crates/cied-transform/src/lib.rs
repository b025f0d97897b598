//! Feature builder for the CIED MRI dataset.
//!
//! Turns the raw export loaded by `cied-ingest` into the canonical analytic
//! table: one [`cied_model::CanonicalRecord`] per patient, laid out as a
//! typed DataFrame whose column order is
//! [`cied_model::canonical_columns`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cied_ingest::load_raw_table;
//! use cied_transform::build_canonical_frame;
//!
//! let table = load_raw_table(Path::new("data/CIED_MRI.xlsx"))?;
//! let canonical = build_canonical_frame(&table)?;
//! ```

mod error;
mod frame;

pub mod composites;
pub mod features;
pub mod schema;

pub use error::{Result, TransformError};
pub use features::{SourceColumns, build_records};
pub use frame::{build_canonical_frame, records_to_frame};
pub use schema::{Coercion, Field, FieldMapping, field_mappings, wall_segments};
