//! Terminal summary of stage reports.

use std::path::Path;

use cied_model::{AttemptStatus, StageReport};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn print_summary(reports: &[StageReport], output_dir: &Path) {
    println!("Output: {}", output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Succeeded"),
        header_cell("Failed"),
        header_cell("Skipped"),
        header_cell("Artifacts"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let (mut succeeded, mut failed, mut skipped, mut artifacts) = (0, 0, 0, 0);
    for report in reports {
        succeeded += report.succeeded_count();
        failed += report.failed_count();
        skipped += report.skipped_count();
        artifacts += report.artifacts().len();
        table.add_row(vec![
            Cell::new(&report.stage)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            count_cell(report.succeeded_count(), Color::Green),
            count_cell(report.failed_count(), Color::Red),
            count_cell(report.skipped_count(), Color::Yellow),
            Cell::new(report.artifacts().len()),
        ]);
    }
    if reports.len() > 1 {
        table.add_row(vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            count_cell(succeeded, Color::Green).add_attribute(Attribute::Bold),
            count_cell(failed, Color::Red).add_attribute(Attribute::Bold),
            count_cell(skipped, Color::Yellow).add_attribute(Attribute::Bold),
            Cell::new(artifacts).add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
    print_attempt_table(reports);
}

/// Lists failed and skipped attempts with their reasons.
fn print_attempt_table(reports: &[StageReport]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Attempt"),
        header_cell("Status"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    let mut rows = 0usize;
    for report in reports {
        for attempt in &report.attempts {
            let (status, reason) = match &attempt.status {
                AttemptStatus::Succeeded => continue,
                AttemptStatus::Failed { reason } => (
                    Cell::new("FAILED")
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold),
                    reason,
                ),
                AttemptStatus::Skipped { reason } => (Cell::new("SKIPPED").fg(Color::Yellow), reason),
            };
            rows += 1;
            table.add_row(vec![
                dim_cell(&report.stage),
                Cell::new(&attempt.key),
                status,
                Cell::new(reason),
            ]);
        }
    }
    if rows == 0 {
        return;
    }
    println!();
    println!("Attempts needing attention:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
