//! In-memory raw table with tolerant column lookup.

use std::collections::HashMap;

use cied_common::format_numeric;
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use crate::error::Result;
use crate::header::{mangle_headers, normalize_header};

/// A single source cell after format-specific decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Classifies a text cell; blank text is empty.
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(text.to_string())
        }
    }
}

/// Builds one column: `Float64` when every non-empty cell is numeric,
/// otherwise `String` with numbers rendered without trailing zeros.
fn build_series(name: &str, cells: Vec<RawCell>) -> Series {
    let all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, RawCell::Empty | RawCell::Number(_)));
    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .into_iter()
            .map(|cell| match cell {
                RawCell::Number(v) => Some(v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .into_iter()
            .map(|cell| match cell {
                RawCell::Empty => None,
                RawCell::Number(v) => Some(format_numeric(v)),
                RawCell::Text(s) => Some(s),
            })
            .collect();
        Series::new(name.into(), values)
    }
}

/// The raw source table: one row per patient, columns named exactly as in
/// the source header after duplicate disambiguation.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
    normalized: HashMap<String, String>,
}

impl RawTable {
    /// Builds a table from a header row and data rows.
    ///
    /// Short rows are padded with empty cells; cells past the header width
    /// are ignored.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<RawCell>>) -> Result<Self> {
        let names = mangle_headers(headers);
        let mut columns: Vec<Vec<RawCell>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.push(cells.next().unwrap_or(RawCell::Empty));
            }
        }
        let series: Vec<Column> = names
            .iter()
            .zip(columns)
            .map(|(name, cells)| build_series(name, cells).into())
            .collect();
        Self::from_dataframe(DataFrame::new(series)?)
    }

    /// Wraps an existing frame, indexing its column names for lookup.
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        let mut normalized = HashMap::new();
        for name in df.get_column_names() {
            normalized
                .entry(normalize_header(name))
                .or_insert_with(|| name.to_string());
        }
        Ok(Self { df, normalized })
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Resolves a requested name to the loaded column name.
    ///
    /// Exact match first, then a whitespace-normalized match.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Ok(column) = self.df.column(name) {
            return Some(column.name().as_str());
        }
        self.normalized
            .get(&normalize_header(name))
            .map(String::as_str)
    }

    /// Returns the column for `name`, or `None` when the export lacks it.
    pub fn series(&self, name: &str) -> Option<&Series> {
        let resolved = self.resolve(name)?;
        self.df
            .column(resolved)
            .ok()
            .map(Column::as_materialized_series)
    }
}
