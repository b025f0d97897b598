//! Row-built CSV artifacts.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::{CsvWriter, DataFrame, SerWriter};

use crate::error::{ReportError, Result};

/// Formats a statistic; non-finite values become an empty cell.
pub fn number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

pub fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

/// A small text table written with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let csv_error = |source| ReportError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(&self.headers).map_err(csv_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| ReportError::Io {
            operation: "flush",
            path: path.to_path_buf(),
            source,
        })
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes an aggregated frame as CSV.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path).map_err(|source| ReportError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_numbers_are_blank() {
        assert_eq!(number(0.25), "0.25");
        assert_eq!(number(f64::NAN), "");
        assert_eq!(number(f64::INFINITY), "");
        assert_eq!(optional(None), "");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.csv");
        let mut table = CsvTable::new(&["term", "coef"]);
        table.push(vec!["Intercept".into(), number(-1.5)]);
        table.push(vec!["C(device_cat)[T.ICD]".into(), number(0.5)]);
        table.write(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        insta::assert_snapshot!(text, @r"
        term,coef
        Intercept,-1.5
        C(device_cat)[T.ICD],0.5
        ");
    }
}
