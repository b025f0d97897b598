//! Format-specific readers for the source export.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use cied_common::{format_numeric, parse_f64};

use crate::error::{IngestError, Result};
use crate::table::{RawCell, RawTable};

/// Source formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl SourceFormat {
    /// Picks the reader from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            "csv" => Ok(SourceFormat::Csv),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Loads the source export into a [`RawTable`].
///
/// Workbooks are read from their first worksheet. The first row is the
/// header row.
pub fn load_raw_table(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = SourceFormat::from_path(path)?;
    let (headers, rows) = match format {
        SourceFormat::Workbook => read_workbook(path)?,
        SourceFormat::Csv => read_csv(path)?,
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::NoHeaderDetected {
            path: path.to_path_buf(),
        });
    }
    let table = RawTable::from_rows(&headers, rows)?;
    if table.height() == 0 {
        tracing::warn!(path = %path.display(), "source has a header row but no data rows");
    }
    tracing::info!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "loaded raw table"
    );
    Ok(table)
}

type Rows = (Vec<String>, Vec<Vec<RawCell>>);

fn workbook_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(v) => RawCell::Number(*v as f64),
        Data::Float(v) if v.is_finite() => RawCell::Number(*v),
        Data::Float(_) => RawCell::Empty,
        Data::Bool(b) => RawCell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from_text(s),
    }
}

fn workbook_header(cell: &Data) -> String {
    match workbook_cell(cell) {
        RawCell::Empty => String::new(),
        RawCell::Number(v) => format_numeric(v),
        RawCell::Text(s) => s,
    }
}

fn read_workbook(path: &Path) -> Result<Rows> {
    let workbook_error = |message: String| IngestError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| IngestError::NoHeaderDetected {
            path: path.to_path_buf(),
        })?
        .iter()
        .map(workbook_header)
        .collect();
    let body = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok((headers, body))
}

fn text_cell(text: &str) -> RawCell {
    match parse_f64(text) {
        Some(v) => RawCell::Number(v),
        None => RawCell::from_text(text),
    }
}

fn read_csv(path: &Path) -> Result<Rows> {
    let csv_error = |message: String| IngestError::CsvParse {
        path: path.to_path_buf(),
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(e.to_string()))?;

    let mut records = reader.records();
    let header_record = records
        .next()
        .ok_or_else(|| IngestError::NoHeaderDetected {
            path: path.to_path_buf(),
        })?
        .map_err(|e| csv_error(e.to_string()))?;
    let headers: Vec<String> = header_record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            // Skip BOM if present
            let field = if idx == 0 {
                field.strip_prefix('\u{feff}').unwrap_or(field)
            } else {
                field
            };
            field.to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| csv_error(e.to_string()))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(text_cell).collect());
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("export.XLSX")).unwrap(),
            SourceFormat::Workbook
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("export.csv")).unwrap(),
            SourceFormat::Csv
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("export.json")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_raw_table(&PathBuf::from("/nonexistent/export.xlsx"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_workbook_cells() {
        assert_eq!(workbook_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(workbook_cell(&Data::Bool(true)), RawCell::Number(1.0));
        assert_eq!(workbook_cell(&Data::String("  ".into())), RawCell::Empty);
        assert_eq!(workbook_header(&Data::Float(2.0)), "2");
    }
}
