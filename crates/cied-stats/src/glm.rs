//! Generalized linear models: logistic regression by IRLS, linear
//! regression by least squares, both with HC3 sandwich covariance.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::design::{DesignEncoder, Family, ModelFrame, ModelSpec, response};
use crate::dist::{Z_975, two_sided_p};
use crate::error::{FitError, Result};

/// Pivot threshold below which the information matrix is treated as
/// rank-deficient, relative to its diagonal entry.
const RANK_TOLERANCE: f64 = 1e-10;
const SEPARATION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Relative deviance change that ends the iteration.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub term: String,
    pub coef: f64,
    pub std_err: f64,
    pub z: f64,
    pub p: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// A fitted model, ready for prediction.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub spec: ModelSpec,
    encoder: DesignEncoder,
    params: DVector<f64>,
    cov: DMatrix<f64>,
    n_obs: usize,
    iterations: usize,
}

fn logistic(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

fn factorize(a: DMatrix<f64>) -> Result<Cholesky<f64, Dyn>> {
    let diagonal = a.diagonal();
    let chol = Cholesky::new(a).ok_or(FitError::Singular)?;
    let l = chol.l_dirty();
    for j in 0..diagonal.len() {
        let pivot = l[(j, j)] * l[(j, j)];
        if !pivot.is_finite() || pivot <= RANK_TOLERANCE * diagonal[j].abs() {
            return Err(FitError::Singular);
        }
    }
    Ok(chol)
}

/// Xᵀ diag(w) X.
fn weighted_gram(x: &DMatrix<f64>, w: &DVector<f64>) -> DMatrix<f64> {
    let mut xw = x.clone();
    for (i, weight) in w.iter().enumerate() {
        xw.row_mut(i).scale_mut(*weight);
    }
    x.transpose() * xw
}

fn binomial_deviance(y: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    y.iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let mi = mi.clamp(1e-300, 1.0 - 1e-16);
            -2.0 * (yi * mi.ln() + (1.0 - yi) * (1.0 - mi).ln())
        })
        .sum()
}

/// HC3 sandwich: B [Σ xᵢxᵢᵀ uᵢ² / (1 - hᵢ)²] B with B = (XᵀWX)⁻¹.
fn hc3_covariance(
    x: &DMatrix<f64>,
    w: &DVector<f64>,
    u: &DVector<f64>,
    bread: &DMatrix<f64>,
) -> DMatrix<f64> {
    let p = x.ncols();
    let mut meat = DMatrix::zeros(p, p);
    for i in 0..x.nrows() {
        let xi = x.row(i).transpose();
        let leverage = w[i] * (xi.transpose() * bread * &xi)[(0, 0)];
        let scale = u[i] * u[i] / (1.0 - leverage).max(f64::EPSILON).powi(2);
        meat += &xi * xi.transpose() * scale;
    }
    bread * meat * bread
}

fn check_outcome(spec: &ModelSpec, y: &DVector<f64>) -> Result<()> {
    let first = y[0];
    if y.iter().all(|v| *v == first) {
        return Err(FitError::ConstantOutcome {
            outcome: spec.outcome.clone(),
        });
    }
    if spec.family == Family::Binomial && y.iter().any(|v| *v != 0.0 && *v != 1.0) {
        return Err(FitError::NonBinaryOutcome {
            outcome: spec.outcome.clone(),
        });
    }
    Ok(())
}

fn irls(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    options: FitOptions,
) -> Result<(DVector<f64>, DVector<f64>, DMatrix<f64>, usize)> {
    let n = x.nrows();
    let mut mu = y.map(|v| (v + 0.5) / 2.0);
    let mut eta = mu.map(|m| (m / (1.0 - m)).ln());
    let mut deviance = binomial_deviance(y, &mu);

    for iteration in 1..=options.max_iterations {
        let w = mu.map(|m| (m * (1.0 - m)).max(1e-12));
        let z = DVector::from_fn(n, |i, _| eta[i] + (y[i] - mu[i]) / w[i]);
        let chol = factorize(weighted_gram(x, &w))?;
        let rhs = x.transpose() * z.component_mul(&w);
        let beta = chol.solve(&rhs);

        eta = x * &beta;
        mu = eta.map(logistic);
        let next = binomial_deviance(y, &mu);
        let converged = (deviance - next).abs() <= options.tolerance * (next.abs() + options.tolerance);
        deviance = next;

        if converged {
            let residual = (y - &mu).amax();
            if residual < SEPARATION_TOLERANCE {
                return Err(FitError::PerfectSeparation);
            }
            let w = mu.map(|m| m * (1.0 - m));
            let bread = factorize(weighted_gram(x, &w))?.inverse();
            return Ok((beta, w, bread, iteration));
        }
    }
    if (y - &mu).amax() < SEPARATION_TOLERANCE {
        return Err(FitError::PerfectSeparation);
    }
    Err(FitError::NotConverged {
        iterations: options.max_iterations,
    })
}

impl FittedModel {
    /// Fits `spec` to a complete-case frame.
    pub fn fit(spec: &ModelSpec, frame: &ModelFrame, options: FitOptions) -> Result<Self> {
        if frame.is_empty() {
            return Err(FitError::EmptyDesign);
        }
        let encoder = DesignEncoder::new(spec, frame)?;
        let x = encoder.matrix(frame)?;
        let y = response(frame, &spec.outcome)?;
        let (n, p) = (x.nrows(), x.ncols());
        if n <= p {
            return Err(FitError::TooFewRows {
                rows: n,
                parameters: p,
            });
        }
        check_outcome(spec, &y)?;

        let (params, w, bread, iterations) = match spec.family {
            Family::Binomial => irls(&x, &y, options)?,
            Family::Gaussian => {
                let w = DVector::from_element(n, 1.0);
                let chol = factorize(weighted_gram(&x, &w))?;
                let beta = chol.solve(&(x.transpose() * &y));
                (beta, w, chol.inverse(), 1)
            }
        };

        let fitted = match spec.family {
            Family::Binomial => (&x * &params).map(logistic),
            Family::Gaussian => &x * &params,
        };
        let u = &y - fitted;
        let cov = hc3_covariance(&x, &w, &u, &bread);
        debug!(
            formula = %spec.formula(),
            rows = n,
            parameters = p,
            iterations,
            "model fitted"
        );
        Ok(Self {
            spec: spec.clone(),
            encoder,
            params,
            cov,
            n_obs: n,
            iterations,
        })
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn encoder(&self) -> &DesignEncoder {
        &self.encoder
    }

    pub fn params(&self) -> &DVector<f64> {
        &self.params
    }

    /// HC3 covariance of the parameters.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.cov
    }

    pub fn term_names(&self) -> Vec<String> {
        self.encoder.column_names()
    }

    /// Coefficient by design column name.
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.encoder.position(term).map(|j| self.params[j])
    }

    pub fn coefficients(&self) -> Vec<Coefficient> {
        self.term_names()
            .into_iter()
            .enumerate()
            .map(|(j, term)| {
                let coef = self.params[j];
                let std_err = self.cov[(j, j)].max(0.0).sqrt();
                let z = coef / std_err;
                Coefficient {
                    term,
                    coef,
                    std_err,
                    z,
                    p: two_sided_p(z),
                    ci_low: coef - Z_975 * std_err,
                    ci_high: coef + Z_975 * std_err,
                }
            })
            .collect()
    }

    /// Linear predictor for every row of `frame`.
    pub fn linear_predictor(&self, frame: &ModelFrame) -> Result<DVector<f64>> {
        Ok(self.encoder.matrix(frame)? * &self.params)
    }

    /// Mean response for every row of `frame`.
    pub fn predict(&self, frame: &ModelFrame) -> Result<Vec<f64>> {
        let eta = self.linear_predictor(frame)?;
        Ok(match self.spec.family {
            Family::Binomial => eta.iter().map(|e| logistic(*e)).collect(),
            Family::Gaussian => eta.iter().copied().collect(),
        })
    }
}

/// Builds the complete-case frame for `spec` and fits it.
pub fn fit_dataframe(
    spec: &ModelSpec,
    df: &polars::prelude::DataFrame,
    options: FitOptions,
) -> Result<(FittedModel, ModelFrame)> {
    let frame = ModelFrame::for_spec(df, spec)?;
    let model = FittedModel::fit(spec, &frame, options)?;
    Ok((model, frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, NamedFrom, Series};

    fn logit_frame() -> DataFrame {
        let x = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
        let y = [0, 0, 1, 0, 0, 1, 1, 0, 1, 1];
        DataFrame::new(vec![
            Column::from(Series::new("x".into(), &x)),
            Column::from(Series::new("y".into(), &y)),
        ])
        .unwrap()
    }

    #[test]
    fn ols_recovers_exact_line() {
        let df = DataFrame::new(vec![
            Column::from(Series::new("x".into(), &[1.0, 2.0, 3.0, 4.0, 5.0])),
            Column::from(Series::new("y".into(), &[3.0, 5.1, 6.9, 9.0, 11.0])),
        ])
        .unwrap();
        let spec = ModelSpec::ols("y").numeric("x");
        let (model, _) = fit_dataframe(&spec, &df, FitOptions::default()).unwrap();
        let slope = model.coefficient("x").unwrap();
        assert!((slope - 1.99).abs() < 1e-9, "slope {slope}");
        assert!(model.coefficients().iter().all(|c| c.std_err.is_finite()));
    }

    #[test]
    fn logit_predictions_are_probabilities() {
        let spec = ModelSpec::logit("y").numeric("x");
        let (model, frame) = fit_dataframe(&spec, &logit_frame(), FitOptions::default()).unwrap();
        assert!(model.coefficient("x").unwrap() > 0.0);
        let probs = model.predict(&frame).unwrap();
        assert!(probs.iter().all(|p| *p > 0.0 && *p < 1.0));
        let table = model.coefficients();
        assert_eq!(table[0].term, "Intercept");
        assert!(table.iter().all(|c| c.ci_low < c.coef && c.coef < c.ci_high));
        assert!(table.iter().all(|c| (0.0..=1.0).contains(&c.p)));
    }
}
