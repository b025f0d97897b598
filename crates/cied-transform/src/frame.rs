//! Canonical records to a typed DataFrame.

use cied_ingest::RawTable;
use cied_model::{CanonicalRecord, Cell, ColumnKind, canonical_columns};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tracing::info;

use crate::error::Result;
use crate::features::build_records;

enum Buffer {
    Int(Vec<Option<i32>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<&'static str>>),
}

impl Buffer {
    fn for_kind(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Flag | ColumnKind::Count => Buffer::Int(Vec::with_capacity(capacity)),
            ColumnKind::Float | ColumnKind::Code => Buffer::Float(Vec::with_capacity(capacity)),
            ColumnKind::Category => Buffer::Text(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (Buffer::Int(values), Cell::Flag(v)) => values.push(Some(v)),
            (Buffer::Int(values), Cell::Count(v)) => values.push(v),
            (Buffer::Float(values), Cell::Float(v) | Cell::Code(v)) => values.push(v),
            (Buffer::Text(values), Cell::Category(v)) => values.push(v),
            (Buffer::Int(values), _) => values.push(None),
            (Buffer::Float(values), _) => values.push(None),
            (Buffer::Text(values), _) => values.push(None),
        }
    }

    fn into_series(self, name: &str) -> Series {
        match self {
            Buffer::Int(values) => Series::new(name.into(), values),
            Buffer::Float(values) => Series::new(name.into(), values),
            Buffer::Text(values) => Series::new(name.into(), values),
        }
    }
}

/// Lays records out as columns in canonical order.
///
/// Flags and counts are `Int32`, floats and codes `Float64`, categories
/// `String`.
pub fn records_to_frame(records: &[CanonicalRecord]) -> Result<DataFrame> {
    let schema = canonical_columns();
    let mut buffers: Vec<Buffer> = schema
        .iter()
        .map(|column| Buffer::for_kind(column.kind, records.len()))
        .collect();

    for record in records {
        for (buffer, cell) in buffers.iter_mut().zip(record.cells()) {
            buffer.push(cell);
        }
    }

    let columns: Vec<Column> = schema
        .iter()
        .zip(buffers)
        .map(|(column, buffer)| buffer.into_series(&column.name).into())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Runs the feature builder over a raw table.
pub fn build_canonical_frame(table: &RawTable) -> Result<DataFrame> {
    let records = build_records(table);
    let df = records_to_frame(&records)?;
    info!(
        rows = df.height(),
        columns = df.width(),
        "built canonical dataset"
    );
    Ok(df)
}
