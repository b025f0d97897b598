//! End-to-end loading of delimited exports.

use std::io::Write;

use cied_ingest::{IngestError, load_raw_table};
use polars::prelude::DataType;
use tempfile::Builder;

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn duplicate_headers_get_sequence_suffixes() {
    let file = write_csv(
        "Any artefact (grade 3 or above),Any artefact (grade 3 or above),Any artefact (grade 3 or above)\n1,0,\n",
    );
    let table = load_raw_table(file.path()).unwrap();
    assert_eq!(
        table.column_names(),
        vec![
            "Any artefact (grade 3 or above)",
            "Any artefact (grade 3 or above).1",
            "Any artefact (grade 3 or above).2",
        ]
    );
    assert_eq!(table.series("Any artefact (grade 3 or above).2").unwrap().null_count(), 1);
}

#[test]
fn numeric_text_and_blank_cells() {
    let file = write_csv("\u{feff}Age,Sex (1-M),Notes\n63, M ,\n 70.5 ,F,  \n");
    let table = load_raw_table(file.path()).unwrap();
    assert_eq!(table.height(), 2);
    assert_eq!(table.series("Age").unwrap().dtype(), &DataType::Float64);
    assert_eq!(table.series("Sex (1-M)").unwrap().dtype(), &DataType::String);
    assert_eq!(table.series("Notes").unwrap().null_count(), 2);
}

#[test]
fn trailing_space_column_resolves() {
    let file = write_csv("MR Conditional ,Age\n1,50\n");
    let table = load_raw_table(file.path()).unwrap();
    assert_eq!(table.resolve("MR Conditional"), Some("MR Conditional "));
}

#[test]
fn empty_file_has_no_header() {
    let file = write_csv("");
    let result = load_raw_table(file.path());
    assert!(matches!(result, Err(IngestError::NoHeaderDetected { .. })));
}

#[test]
fn blank_header_row_is_rejected() {
    let file = write_csv(" , \n1,2\n");
    let result = load_raw_table(file.path());
    assert!(matches!(result, Err(IngestError::NoHeaderDetected { .. })));
}
