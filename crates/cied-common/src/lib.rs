//! Shared utilities for the CIED MRI pipeline crates.
//!
//! This crate provides the leaf coercion rules every derived column is built
//! from, plus Polars `AnyValue` helpers used across the workspace.

pub mod coerce;
pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use coerce::{
    binary_value, numeric_value, safe_divide, safe_ratio, to_binary, to_numeric, try_binary_value,
};
pub use polars::{any_to_f64, any_to_string, format_numeric, parse_f64, series_f64_values};
