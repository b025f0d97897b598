//! Average marginal effects with delta-method standard errors.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::design::{Family, ModelFrame};
use crate::dist::{Z_975, two_sided_p};
use crate::error::{FitError, Result};
use crate::glm::FittedModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalEffect {
    pub term: String,
    pub dydx: f64,
    pub std_err: f64,
    pub z: f64,
    pub p: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Average marginal effect of every non-intercept design column over the
/// rows of `frame`.
///
/// Factor columns are treated like continuous ones: the derivative of the
/// mean response with respect to the indicator.
pub fn average_marginal_effects(
    model: &FittedModel,
    frame: &ModelFrame,
) -> Result<Vec<MarginalEffect>> {
    if frame.is_empty() {
        return Err(FitError::EmptyDesign);
    }
    let x = model.encoder().matrix(frame)?;
    let beta = model.params();
    let eta = &x * beta;
    let n = x.nrows() as f64;
    let p = x.ncols();

    // dμ/dη and its derivative for each row.
    let (f, df): (Vec<f64>, Vec<f64>) = eta
        .iter()
        .map(|&e| match model.spec.family {
            Family::Binomial => {
                let mu = 1.0 / (1.0 + (-e).exp());
                let f = mu * (1.0 - mu);
                (f, f * (1.0 - 2.0 * mu))
            }
            Family::Gaussian => (1.0, 0.0),
        })
        .unzip();
    let mean_f = f.iter().sum::<f64>() / n;

    let cov = model.covariance();
    let names = model.term_names();
    let mut effects = Vec::with_capacity(p.saturating_sub(1));
    for j in 1..p {
        let dydx = beta[j] * mean_f;
        let gradient = DVector::from_fn(p, |k, _| {
            let weighted: f64 = (0..x.nrows()).map(|i| df[i] * x[(i, k)]).sum::<f64>() / n;
            let own = if k == j { mean_f } else { 0.0 };
            own + beta[j] * weighted
        });
        let variance = (gradient.transpose() * cov * &gradient)[(0, 0)];
        let std_err = variance.max(0.0).sqrt();
        let z = dydx / std_err;
        effects.push(MarginalEffect {
            term: names[j].clone(),
            dydx,
            std_err,
            z,
            p: two_sided_p(z),
            ci_low: dydx - Z_975 * std_err,
            ci_high: dydx + Z_975 * std_err,
        });
    }
    Ok(effects)
}
