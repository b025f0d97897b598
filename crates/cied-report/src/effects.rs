//! Main-effect logistic models per outcome and artefact metric.

use cied_model::StageReport;
use cied_model::columns::{ARTIFACT_BURDEN, DEVICE_CAT, MAX_RATIO};
use cied_stats::describe::{mean, quantiles};
use cied_stats::{FittedModel, ModelFrame, average_marginal_effects, fit_dataframe};
use polars::prelude::DataFrame;
use tracing::info_span;

use crate::artifacts::{coefficient_table, margins_table};
use crate::attempt::{fail_attempt, run_attempt};
use crate::error::{AttemptError, Result};
use crate::settings::StageContext;
use crate::table::{CsvTable, number, optional};
use crate::vars::{DEVICE_LEVELS, OUTCOMES, main_effect_spec};

/// Artefact metrics entered as the exposure of interest.
pub const METRICS: [&str; 2] = [ARTIFACT_BURDEN, MAX_RATIO];

/// Mean predicted probability with `metric` fixed at each requested
/// percentile (among the model rows) and the device set to each level.
pub fn dose_response(
    model: &FittedModel,
    frame: &ModelFrame,
    outcome: &str,
    metric: &str,
    percentiles: &[f64],
) -> std::result::Result<CsvTable, AttemptError> {
    let values = quantiles(frame.numeric(metric)?, percentiles);
    let mut table = CsvTable::new(&[DEVICE_CAT, "metric", "q", "value", "mean_prob", "outcome"]);
    for device in DEVICE_LEVELS {
        let assigned = frame.with_level(DEVICE_CAT, device);
        for (q, value) in percentiles.iter().zip(&values) {
            let Some(value) = *value else { continue };
            let probs = model.predict(&assigned.with_constant(metric, value))?;
            table.push(vec![
                device.to_string(),
                metric.to_string(),
                number(*q),
                number(value),
                optional(mean(&probs)),
                outcome.to_string(),
            ]);
        }
    }
    Ok(table)
}

pub fn run_main_effects(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("models");
    for outcome in OUTCOMES {
        for metric in METRICS {
            let span = info_span!("model", outcome, variant = metric);
            let _guard = span.enter();

            let stem = format!("model_{outcome}_{metric}");
            let spec = main_effect_spec(outcome, metric);
            let (model, frame) = match fit_dataframe(&spec, df, ctx.settings.fit) {
                Ok(fitted) => fitted,
                Err(err) => {
                    let err = AttemptError::from(err);
                    for kind in ["coefs", "margins", "dose_response"] {
                        fail_attempt(&mut report, &format!("{stem}_{kind}"), &err);
                    }
                    continue;
                }
            };

            run_attempt(
                &mut report,
                &format!("{stem}_coefs"),
                ctx.layout.table(&format!("{stem}_coefs.csv")),
                |path| Ok(coefficient_table(&model).write(path)?),
            );
            run_attempt(
                &mut report,
                &format!("{stem}_margins"),
                ctx.layout.table(&format!("{stem}_margins.csv")),
                |path| {
                    let effects = average_marginal_effects(&model, &frame)?;
                    Ok(margins_table(&effects).write(path)?)
                },
            );
            run_attempt(
                &mut report,
                &format!("{stem}_dose_response"),
                ctx.layout.table(&format!("{stem}_dose_response.csv")),
                |path| {
                    let table = dose_response(
                        &model,
                        &frame,
                        outcome,
                        metric,
                        &ctx.settings.dose_quantiles,
                    )?;
                    Ok(table.write(path)?)
                },
            );
        }
    }
    Ok(report)
}
