//! Per-device stratified logistic models.

use cied_model::columns::{ARTIFACT_BURDEN, DEVICE_CAT, LV_VISIBILITY_SCORE, MAX_RATIO, PRE_DX_CAT};
use cied_model::{Attempt, DeviceCategory, StageReport};
use cied_stats::{FitOptions, ModelSpec, fit_dataframe};
use polars::prelude::{DataFrame, IntoLazy, col, lit};
use tracing::{info, info_span, warn};

use crate::attempt::{run_attempt, skip_attempt};
use crate::error::Result;
use crate::settings::StageContext;
use crate::table::{CsvTable, number};
use crate::vars::{CLINICAL, OUTCOMES, sequence_flags};

pub const HETEROGENEITY_FILE: &str = "heterogeneity_models.csv";

pub fn stratum_spec(outcome: &str) -> ModelSpec {
    let mut spec = ModelSpec::logit(outcome)
        .numerics(&[ARTIFACT_BURDEN, MAX_RATIO, LV_VISIBILITY_SCORE])
        .numerics(&CLINICAL)
        .categorical(PRE_DX_CAT);
    for flag in sequence_flags() {
        spec = spec.numeric(flag);
    }
    spec
}

fn stratum(df: &DataFrame, device: DeviceCategory) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(DEVICE_CAT).eq(lit(device.as_str())))
        .collect()?)
}

/// Fits every outcome in one stratum, appending coefficient rows to `table`.
/// A failed fit contributes a single `ERROR` row.
fn fit_stratum(
    report: &mut StageReport,
    table: &mut CsvTable,
    device: DeviceCategory,
    data: &DataFrame,
    options: FitOptions,
) {
    for outcome in OUTCOMES {
        let span = info_span!("model", outcome, variant = device.as_str());
        let _guard = span.enter();
        let key = format!("heterogeneity_{device}_{outcome}");
        match fit_dataframe(&stratum_spec(outcome), data, options) {
            Ok((model, _)) => {
                for coef in model.coefficients() {
                    table.push(vec![
                        device.to_string(),
                        outcome.to_string(),
                        coef.term,
                        number(coef.coef),
                        number(coef.std_err),
                        number(coef.p),
                    ]);
                }
                report.push(Attempt::succeeded(key, None));
            }
            Err(err) => {
                warn!(reason = %err, "stratum model failed");
                table.push(vec![
                    device.to_string(),
                    outcome.to_string(),
                    "ERROR".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]);
                report.push(Attempt::failed(key, err.to_string()));
            }
        }
    }
}

pub fn run_heterogeneity(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("heterogeneity");
    if df.column(DEVICE_CAT).is_err() {
        skip_attempt(&mut report, "heterogeneity_models", "device_cat column absent");
        return Ok(report);
    }

    let mut table = CsvTable::new(&[DEVICE_CAT, "outcome", "term", "coef", "se", "p"]);
    for &device in &ctx.settings.stratum_devices {
        let data = stratum(df, device)?;
        if data.height() < ctx.settings.min_stratum_size {
            skip_attempt(
                &mut report,
                &format!("heterogeneity_{device}"),
                &format!(
                    "stratum has {} rows (minimum {})",
                    data.height(),
                    ctx.settings.min_stratum_size
                ),
            );
            continue;
        }
        info!(device = %device, rows = data.height(), "fitting stratum");
        fit_stratum(&mut report, &mut table, device, &data, ctx.settings.fit);
    }

    if table.is_empty() {
        skip_attempt(&mut report, "heterogeneity_models", "no stratum was large enough");
    } else {
        run_attempt(
            &mut report,
            "heterogeneity_models",
            ctx.layout.table(HETEROGENEITY_FILE),
            |path| Ok(table.write(path)?),
        );
    }
    Ok(report)
}
