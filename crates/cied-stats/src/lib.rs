//! Statistical models for the CIED-MRI analyses.
//!
//! - [`design`]: model specifications, complete-case frames and
//!   treatment-coded design matrices
//! - [`glm`]: logistic and linear regression with HC3 covariance
//! - [`margins`]: average marginal effects
//! - [`mediation`]: ACME / ADE decomposition
//! - [`describe`]: summaries, quantile bins and density estimates

pub mod describe;
pub mod design;
pub mod dist;
pub mod error;
pub mod glm;
pub mod margins;
pub mod mediation;

pub use describe::{GaussianKde, Summary};
pub use design::{DesignEncoder, Family, ModelFrame, ModelSpec, Term, compare_levels};
pub use error::{FitError, Result};
pub use glm::{Coefficient, FitOptions, FittedModel, fit_dataframe};
pub use margins::{MarginalEffect, average_marginal_effects};
pub use mediation::{MediationDesign, MediationEffect, mediation_effects};
