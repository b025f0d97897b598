//! Counterfactual mediation effects from a mediator model and an outcome
//! model.

use serde::{Deserialize, Serialize};

use crate::design::ModelFrame;
use crate::error::{FitError, Result};
use crate::glm::FittedModel;

/// Effects of moving `treatment` from the control level to the treated
/// level, averaged over the frame's rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediationEffect {
    pub contrast: String,
    /// Average causal mediation effect.
    pub acme: f64,
    /// Average direct effect.
    pub ade: f64,
    pub total: f64,
    /// `acme / total`; absent when the total effect is zero.
    pub prop_mediated: Option<f64>,
}

/// Names the variables of a mediation analysis.
#[derive(Debug, Clone, Copy)]
pub struct MediationDesign<'a> {
    pub treatment: &'a str,
    pub mediator: &'a str,
    pub treated: &'a str,
    pub control: &'a str,
}

fn mean_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x - y).sum::<f64>() / a.len() as f64
}

/// Point estimates of ACME, ADE and total effect.
///
/// With Y(a, M(a')) the predicted outcome under treatment `a` and the
/// mediator predicted under `a'`:
/// ACME = mean Y(1, M(1)) - Y(1, M(0)), ADE = mean Y(1, M(0)) - Y(0, M(0)).
pub fn mediation_effects(
    mediator_model: &FittedModel,
    outcome_model: &FittedModel,
    frame: &ModelFrame,
    design: MediationDesign<'_>,
) -> Result<MediationEffect> {
    if frame.is_empty() {
        return Err(FitError::EmptyDesign);
    }
    let treated = frame.with_level(design.treatment, design.treated);
    let control = frame.with_level(design.treatment, design.control);

    let m_treated = mediator_model.predict(&treated)?;
    let m_control = mediator_model.predict(&control)?;

    let y11 = outcome_model.predict(&treated.with_numeric(design.mediator, m_treated))?;
    let y10 = outcome_model.predict(&treated.with_numeric(design.mediator, m_control.clone()))?;
    let y00 = outcome_model.predict(&control.with_numeric(design.mediator, m_control))?;

    let acme = mean_difference(&y11, &y10);
    let ade = mean_difference(&y10, &y00);
    let total = mean_difference(&y11, &y00);
    Ok(MediationEffect {
        contrast: format!("{} vs {}", design.treated, design.control),
        acme,
        ade,
        total,
        prop_mediated: (total != 0.0).then(|| acme / total),
    })
}
