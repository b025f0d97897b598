//! Entry points behind each subcommand.

use anyhow::{Context, Result};
use cied_ingest::{RawTable, load_raw_table};
use cied_model::{Attempt, StageReport};
use cied_report::{Stage, StageContext, run_stage};
use cied_store::{SnapshotFormat, load_canonical, save_canonical};
use cied_transform::{Field, build_canonical_frame, field_mappings};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};

use crate::config::PipelineConfig;
use crate::logging::redact_value;

/// Logs raw device codes that did not map to a device category.
fn log_unresolved_devices(table: &RawTable, df: &DataFrame) {
    let Some(raw_name) = field_mappings()
        .into_iter()
        .find(|m| m.field == Field::DeviceType)
        .map(|m| m.raw)
    else {
        return;
    };
    let (Some(raw), Ok(category)) = (table.series(&raw_name), df.column("device_cat")) else {
        return;
    };
    let mut unresolved = 0usize;
    for row in 0..df.height() {
        let category_missing = category.get(row).is_ok_and(|v| v.is_null());
        let Ok(value) = raw.get(row) else {
            continue;
        };
        if !category_missing || value.is_null() {
            continue;
        }
        unresolved += 1;
        debug!(row, value = redact_value(&value.to_string()), "unrecognized device code");
    }
    if unresolved > 0 {
        warn!(rows = unresolved, "device category unresolved; rows excluded from device comparisons");
    }
}

/// Reads the source export, builds the canonical dataset and writes its
/// snapshots.
///
/// A failed parquet snapshot is reported as a failed attempt; a failed CSV
/// snapshot is an error.
pub fn run_prep(config: &PipelineConfig) -> Result<StageReport> {
    let span = info_span!("stage", stage = "prep");
    let _guard = span.enter();

    let source = &config.paths.source;
    let table = load_raw_table(source)
        .with_context(|| format!("load source {}", source.display()))?;
    let mut df = build_canonical_frame(&table).context("build canonical dataset")?;
    log_unresolved_devices(&table, &df);

    let paths = config.dataset_paths();
    let manifest = save_canonical(&mut df, &paths, Some(source.as_path()))
        .with_context(|| format!("write canonical dataset to {}", paths.csv.display()))?;

    let mut report = StageReport::new("prep");
    report.push(if manifest.has_format(SnapshotFormat::Parquet) {
        Attempt::succeeded("clean_parquet", Some(paths.parquet.clone()))
    } else {
        Attempt::failed("clean_parquet", "parquet snapshot could not be written")
    });
    report.push(Attempt::succeeded("clean_csv", Some(paths.csv.clone())));
    info!(rows = manifest.rows, columns = df.width(), "prep finished");
    Ok(report)
}

fn stage_context(config: &PipelineConfig) -> Result<StageContext> {
    Ok(StageContext::new(
        config.analysis_settings()?,
        config.output_layout(),
    ))
}

fn load_dataset(config: &PipelineConfig) -> Result<DataFrame> {
    let paths = config.dataset_paths();
    let loaded = load_canonical(&paths).context("load canonical dataset (run `cied prep` first)")?;
    if loaded.format == SnapshotFormat::Csv {
        warn!(path = %paths.csv.display(), "using CSV snapshot");
    }
    Ok(loaded.df)
}

/// Runs one analysis stage against the stored canonical dataset.
pub fn run_analysis(config: &PipelineConfig, stage: Stage) -> Result<StageReport> {
    let ctx = stage_context(config)?;
    let df = load_dataset(config)?;
    run_stage(stage, &df, &ctx).with_context(|| format!("{stage} stage"))
}

/// Prep followed by every analysis stage.
///
/// A stage-level error stops the run; failed attempts inside a stage do not.
pub fn run_all(config: &PipelineConfig) -> Result<Vec<StageReport>> {
    let ctx = stage_context(config)?;
    let mut reports = vec![run_prep(config)?];
    let df = load_dataset(config)?;
    for stage in Stage::ALL {
        reports.push(run_stage(stage, &df, &ctx).with_context(|| format!("{stage} stage"))?);
    }
    Ok(reports)
}
