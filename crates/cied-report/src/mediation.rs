//! Device effect on diagnostic change mediated through artefact burden.

use cied_model::{Attempt, StageReport};
use cied_model::columns::{
    ARTIFACT_BURDEN, DEVICE_CAT, DX_CHANGE, LEFT_VS_OTHER, MR_CONDITIONAL, N_LEADS,
    NORM_DIST_CARD_SIL, NORM_DIST_LV_APEX, PRE_DX_CAT,
};
use cied_stats::{
    FitOptions, FittedModel, MediationDesign, MediationEffect, ModelFrame, ModelSpec,
    fit_dataframe, mediation_effects,
};
use polars::prelude::DataFrame;
use tracing::info;

use crate::attempt::{fail_attempt, run_attempt};
use crate::error::{AttemptError, Result};
use crate::settings::StageContext;
use crate::table::{CsvTable, number, optional};
use crate::vars::CLINICAL;

pub const MEDIATION_FILE: &str = "mediation_results.csv";

const CONTROL: &str = "PPM";
const TREATED: [&str; 2] = ["ICD", "CRT"];

pub fn mediator_spec() -> ModelSpec {
    ModelSpec::ols(ARTIFACT_BURDEN)
        .categorical(DEVICE_CAT)
        .numerics(&[
            LEFT_VS_OTHER,
            NORM_DIST_CARD_SIL,
            NORM_DIST_LV_APEX,
            N_LEADS,
            MR_CONDITIONAL,
        ])
        .numerics(&CLINICAL)
}

pub fn outcome_spec() -> ModelSpec {
    ModelSpec::logit(DX_CHANGE)
        .categorical(DEVICE_CAT)
        .numeric(ARTIFACT_BURDEN)
        .numerics(&CLINICAL)
        .categorical(PRE_DX_CAT)
}

fn union<'a>(a: Vec<&'a str>, b: Vec<&'a str>) -> Vec<&'a str> {
    let mut out = a;
    for name in b {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Both fitted models and the rows the decomposition averages over.
pub struct MediationFit {
    mediator: FittedModel,
    outcome: FittedModel,
    rows: ModelFrame,
}

/// Fits the mediator and outcome models.
pub fn fit_mediation(
    df: &DataFrame,
    options: FitOptions,
) -> std::result::Result<MediationFit, AttemptError> {
    let mediator_spec = mediator_spec();
    let outcome_spec = outcome_spec();
    let (mediator, _) = fit_dataframe(&mediator_spec, df, options)?;
    let (outcome, _) = fit_dataframe(&outcome_spec, df, options)?;

    // Rows with every predictor of both models; the mediator itself is
    // replaced by its prediction.
    let numeric: Vec<&str> = union(
        mediator_spec.numeric_predictors(),
        outcome_spec.numeric_predictors(),
    )
    .into_iter()
    .filter(|name| *name != ARTIFACT_BURDEN)
    .collect();
    let categorical = union(
        mediator_spec.categorical_predictors(),
        outcome_spec.categorical_predictors(),
    );
    let rows = ModelFrame::from_dataframe(df, &numeric, &categorical)?;
    let known: Vec<bool> = mediator
        .encoder()
        .known_rows(&rows)?
        .into_iter()
        .zip(outcome.encoder().known_rows(&rows)?)
        .map(|(a, b)| a && b)
        .collect();
    let rows = rows.filter(&known);
    info!(rows = rows.len(), "mediation evaluation rows");
    Ok(MediationFit {
        mediator,
        outcome,
        rows,
    })
}

/// Decomposes the `treated` vs PPM contrast.
pub fn contrast_effect(
    fit: &MediationFit,
    treated: &str,
) -> std::result::Result<MediationEffect, AttemptError> {
    let design = MediationDesign {
        treatment: DEVICE_CAT,
        mediator: ARTIFACT_BURDEN,
        treated,
        control: CONTROL,
    };
    Ok(mediation_effects(
        &fit.mediator,
        &fit.outcome,
        &fit.rows,
        design,
    )?)
}

/// One row per contrast; a failed contrast keeps its label with empty
/// statistics.
pub fn mediation_table(rows: &[(String, Option<MediationEffect>)]) -> CsvTable {
    let mut table = CsvTable::new(&["contrast", "ACME", "ADE", "Total", "PropMediated"]);
    for (contrast, effect) in rows {
        table.push(match effect {
            Some(effect) => vec![
                contrast.clone(),
                number(effect.acme),
                number(effect.ade),
                number(effect.total),
                optional(effect.prop_mediated),
            ],
            None => vec![
                contrast.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        });
    }
    table
}

pub fn run_mediation(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("mediation");
    let fit = match fit_mediation(df, ctx.settings.fit) {
        Ok(fit) => fit,
        Err(err) => {
            fail_attempt(&mut report, "mediation_results", &err);
            return Ok(report);
        }
    };

    let mut rows = Vec::with_capacity(TREATED.len());
    for treated in TREATED {
        let key = format!("mediation_{treated}_vs_{CONTROL}");
        let contrast = format!("{treated} vs {CONTROL}");
        match contrast_effect(&fit, treated) {
            Ok(effect) => {
                report.push(Attempt::succeeded(key, None));
                rows.push((contrast, Some(effect)));
            }
            Err(err) => {
                fail_attempt(&mut report, &key, &err);
                rows.push((contrast, None));
            }
        }
    }

    run_attempt(
        &mut report,
        "mediation_results",
        ctx.layout.table(MEDIATION_FILE),
        |path| Ok(mediation_table(&rows).write(path)?),
    );
    Ok(report)
}
