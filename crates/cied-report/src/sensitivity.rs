//! Alternative exposure metrics and a complete-case restriction.

use cied_model::columns::{
    AGE, ARTIFACT_BURDEN, DEVICE_CAT, DX_CHANGE, MAX_RATIO, MR_CONDITIONAL, NON_DIAGNOSTIC,
    SEX_MALE, severe_art_column,
};
use cied_model::{Sequence, StageReport};
use cied_stats::{ModelSpec, fit_dataframe};
use polars::prelude::{DataFrame, IntoLazy, col, lit};
use tracing::info_span;

use crate::artifacts::coefficient_table;
use crate::attempt::{run_attempt, skip_attempt};
use crate::error::{AttemptError, ReportError, Result};
use crate::settings::StageContext;
use crate::vars::{OUTCOMES, device_metric_spec};

pub const COMPLETE_CASE_FILE: &str = "sens_dx_change_complete_case.csv";

/// Alternative metrics: the maximum ratio and each per-sequence severe flag.
pub fn sensitivity_metrics() -> Vec<String> {
    let mut metrics = vec![MAX_RATIO.to_string()];
    metrics.extend(Sequence::ALL.into_iter().map(severe_art_column));
    metrics
}

pub fn complete_case_spec() -> ModelSpec {
    ModelSpec::logit(DX_CHANGE)
        .categorical(DEVICE_CAT)
        .numerics(&[MR_CONDITIONAL, ARTIFACT_BURDEN, AGE, SEX_MALE])
}

/// Rows with a diagnostic study.
fn diagnostic_rows(df: &DataFrame) -> std::result::Result<DataFrame, AttemptError> {
    df.clone()
        .lazy()
        .filter(col(NON_DIAGNOSTIC).eq(lit(0)))
        .collect()
        .map_err(|err| ReportError::from(err).into())
}

pub fn run_sensitivity(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("sensitivity");
    let metrics = sensitivity_metrics();
    for outcome in OUTCOMES {
        for metric in &metrics {
            let key = format!("sens_{outcome}_{metric}");
            if df.column(metric).is_err() {
                skip_attempt(&mut report, &key, &format!("column {metric} absent"));
                continue;
            }
            let span = info_span!("model", outcome, variant = metric.as_str());
            let _guard = span.enter();
            run_attempt(
                &mut report,
                &key,
                ctx.layout.table(&format!("{key}.csv")),
                |path| {
                    let spec = device_metric_spec(outcome, metric);
                    let (model, _) = fit_dataframe(&spec, df, ctx.settings.fit)?;
                    Ok(coefficient_table(&model).write(path)?)
                },
            );
        }
    }

    let span = info_span!("model", outcome = DX_CHANGE, variant = "complete_case");
    let _guard = span.enter();
    if df.column(NON_DIAGNOSTIC).is_err() {
        skip_attempt(
            &mut report,
            "sens_dx_change_complete_case",
            "column NonDiagnostic absent",
        );
    } else {
        run_attempt(
            &mut report,
            "sens_dx_change_complete_case",
            ctx.layout.table(COMPLETE_CASE_FILE),
            |path| {
                let data = diagnostic_rows(df)?;
                let (model, _) = fit_dataframe(&complete_case_spec(), &data, ctx.settings.fit)?;
                Ok(coefficient_table(&model).write(path)?)
            },
        );
    }
    Ok(report)
}
