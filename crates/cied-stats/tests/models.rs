//! Fitting failures, marginal effects and mediation on small frames.

use cied_stats::{
    FitError, FitOptions, MediationDesign, ModelFrame, ModelSpec, average_marginal_effects,
    fit_dataframe, mediation_effects,
};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

fn frame(columns: Vec<(&str, Vec<f64>)>) -> DataFrame {
    DataFrame::new(
        columns
            .into_iter()
            .map(|(name, values)| Column::from(Series::new(name.into(), values)))
            .collect(),
    )
    .unwrap()
}

const X: [f64; 8] = [0.3, 1.1, 1.9, 2.4, 3.2, 3.8, 4.5, 5.6];

#[test]
fn duplicated_column_is_singular() {
    let df = frame(vec![
        ("y", vec![1.0, 2.0, 2.5, 3.9, 5.2, 5.8, 7.1, 8.0]),
        ("x", X.to_vec()),
        ("x_copy", X.to_vec()),
    ]);
    let spec = ModelSpec::ols("y").numerics(&["x", "x_copy"]);
    let err = fit_dataframe(&spec, &df, FitOptions::default()).unwrap_err();
    assert_eq!(err, FitError::Singular);
}

#[test]
fn constant_outcome_is_rejected() {
    let df = frame(vec![("y", vec![1.0; 8]), ("x", X.to_vec())]);
    let spec = ModelSpec::logit("y").numeric("x");
    let err = fit_dataframe(&spec, &df, FitOptions::default()).unwrap_err();
    assert_eq!(err, FitError::ConstantOutcome { outcome: "y".into() });
}

#[test]
fn separated_outcome_is_reported() {
    let y: Vec<f64> = X.iter().map(|x| if *x > 2.5 { 1.0 } else { 0.0 }).collect();
    let df = frame(vec![("y", y), ("x", X.to_vec())]);
    let spec = ModelSpec::logit("y").numeric("x");
    let err = fit_dataframe(&spec, &df, FitOptions::default()).unwrap_err();
    assert!(
        matches!(err, FitError::PerfectSeparation | FitError::Singular | FitError::NotConverged { .. }),
        "{err:?}"
    );
}

#[test]
fn too_few_rows() {
    let df = frame(vec![("y", vec![0.0, 1.0]), ("x", vec![1.0, 2.0])]);
    let spec = ModelSpec::logit("y").numeric("x");
    let err = fit_dataframe(&spec, &df, FitOptions::default()).unwrap_err();
    assert_eq!(err, FitError::TooFewRows { rows: 2, parameters: 2 });
}

#[test]
fn linear_marginal_effects_equal_coefficients() {
    let df = frame(vec![
        ("y", vec![1.0, 2.0, 2.5, 3.9, 5.2, 5.8, 7.1, 8.0]),
        ("x", X.to_vec()),
    ]);
    let spec = ModelSpec::ols("y").numeric("x");
    let (model, frame) = fit_dataframe(&spec, &df, FitOptions::default()).unwrap();
    let effects = average_marginal_effects(&model, &frame).unwrap();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].term, "x");
    assert!((effects[0].dydx - model.coefficient("x").unwrap()).abs() < 1e-12);
    let se = model.coefficients()[1].std_err;
    assert!((effects[0].std_err - se).abs() < 1e-12);
}

#[test]
fn logistic_marginal_effects_are_scaled_slopes() {
    let y = vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
    let df = frame(vec![("y", y), ("x", X.to_vec())]);
    let spec = ModelSpec::logit("y").numeric("x");
    let (model, frame) = fit_dataframe(&spec, &df, FitOptions::default()).unwrap();
    let effect = &average_marginal_effects(&model, &frame).unwrap()[0];
    let slope = model.coefficient("x").unwrap();
    assert!(effect.dydx > 0.0 && effect.dydx < slope * 0.25 + 1e-12);
    assert!(effect.std_err > 0.0);
}

fn mediation_frame() -> DataFrame {
    let treated = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
    let noise = [0.1, -0.2, 0.05, 0.15, -0.1, 0.0, 0.2, -0.05, -0.15, 0.1];
    let m: Vec<f64> = treated.iter().zip(noise).map(|(t, e)| 1.0 + 2.0 * t + e).collect();
    let y: Vec<f64> = treated
        .iter()
        .zip(&m)
        .zip(noise.iter().rev())
        .map(|((t, m), e)| 0.5 + t + 3.0 * m + e)
        .collect();
    let dev: Vec<&str> = treated.iter().map(|t| if *t == 1.0 { "B" } else { "A" }).collect();
    DataFrame::new(vec![
        Column::from(Series::new("dev".into(), dev)),
        Column::from(Series::new("m".into(), m)),
        Column::from(Series::new("y".into(), y)),
    ])
    .unwrap()
}

#[test]
fn linear_mediation_decomposes_the_total_effect() {
    let df = mediation_frame();
    let mediator_spec = ModelSpec::ols("m").categorical("dev");
    let outcome_spec = ModelSpec::ols("y").categorical("dev").numeric("m");
    let (mediator, _) = fit_dataframe(&mediator_spec, &df, FitOptions::default()).unwrap();
    let (outcome, _) = fit_dataframe(&outcome_spec, &df, FitOptions::default()).unwrap();
    let rows = ModelFrame::from_dataframe(&df, &[], &["dev"]).unwrap();

    let design = MediationDesign {
        treatment: "dev",
        mediator: "m",
        treated: "B",
        control: "A",
    };
    let effect = mediation_effects(&mediator, &outcome, &rows, design).unwrap();
    let a = mediator.coefficient("C(dev)[T.B]").unwrap();
    let b = outcome.coefficient("m").unwrap();
    let direct = outcome.coefficient("C(dev)[T.B]").unwrap();
    assert_eq!(effect.contrast, "B vs A");
    assert!((effect.acme - a * b).abs() < 1e-9);
    assert!((effect.ade - direct).abs() < 1e-9);
    assert!((effect.total - (effect.acme + effect.ade)).abs() < 1e-9);
    let prop = effect.prop_mediated.unwrap();
    assert!((prop - effect.acme / effect.total).abs() < 1e-12);
}

#[test]
fn zero_total_effect_leaves_proportion_empty() {
    let df = mediation_frame();
    let (mediator, _) =
        fit_dataframe(&ModelSpec::ols("m").categorical("dev"), &df, FitOptions::default()).unwrap();
    let (outcome, _) = fit_dataframe(
        &ModelSpec::ols("y").categorical("dev").numeric("m"),
        &df,
        FitOptions::default(),
    )
    .unwrap();
    let rows = ModelFrame::from_dataframe(&df, &[], &["dev"]).unwrap();
    let design = MediationDesign {
        treatment: "dev",
        mediator: "m",
        treated: "A",
        control: "A",
    };
    let effect = mediation_effects(&mediator, &outcome, &rows, design).unwrap();
    assert_eq!(effect.total, 0.0);
    assert_eq!(effect.prop_mediated, None);
}

#[test]
fn unknown_contrast_level_fails() {
    let df = mediation_frame();
    let (mediator, _) =
        fit_dataframe(&ModelSpec::ols("m").categorical("dev"), &df, FitOptions::default()).unwrap();
    let (outcome, _) = fit_dataframe(
        &ModelSpec::ols("y").categorical("dev").numeric("m"),
        &df,
        FitOptions::default(),
    )
    .unwrap();
    let rows = ModelFrame::from_dataframe(&df, &[], &["dev"]).unwrap();
    let design = MediationDesign {
        treatment: "dev",
        mediator: "m",
        treated: "C",
        control: "A",
    };
    let err = mediation_effects(&mediator, &outcome, &rows, design).unwrap_err();
    assert!(matches!(err, FitError::UnknownLevel { .. }));
}
