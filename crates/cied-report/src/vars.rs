//! Variable groups shared by the model stages.

use cied_model::Sequence;
use cied_model::columns::{
    ADD_INFO, AFIB, AGE, CAD, CKD, DEVICE_CAT, DX_CHANGE, HF, HTN, LV_VISIBILITY_SCORE,
    MGMT_CHANGE, MI, MR_CONDITIONAL, NON_DIAGNOSTIC, PRE_DX_CAT, SEX_MALE, has_sequence_column,
};
use cied_stats::ModelSpec;

/// Binary outcomes modelled by the main, heterogeneity and sensitivity stages.
pub const OUTCOMES: [&str; 4] = [DX_CHANGE, MGMT_CHANGE, ADD_INFO, NON_DIAGNOSTIC];

/// Demographic and comorbidity adjustment set.
pub const CLINICAL: [&str; 8] = [AGE, SEX_MALE, HF, HTN, CAD, MI, AFIB, CKD];

/// Device levels in reporting order.
pub const DEVICE_LEVELS: [&str; 3] = ["PPM", "ICD", "CRT"];

pub fn sequence_flags() -> Vec<String> {
    Sequence::ALL.into_iter().map(has_sequence_column).collect()
}

/// Shared head of the main-effect and sensitivity formulas:
/// `y ~ C(device_cat) + mr_conditional + metric + lv_visibility_score +
/// clinical + C(pre_dx_cat) + has_* + C(device_cat):metric +
/// C(device_cat):mr_conditional`.
pub fn device_metric_spec(outcome: &str, metric: &str) -> ModelSpec {
    let mut spec = ModelSpec::logit(outcome)
        .categorical(DEVICE_CAT)
        .numeric(MR_CONDITIONAL)
        .numeric(metric)
        .numeric(LV_VISIBILITY_SCORE)
        .numerics(&CLINICAL)
        .categorical(PRE_DX_CAT);
    for flag in sequence_flags() {
        spec = spec.numeric(flag);
    }
    spec.interaction(DEVICE_CAT, metric)
        .interaction(DEVICE_CAT, MR_CONDITIONAL)
}

/// `device_metric_spec` plus diagnosis-by-sequence interactions.
pub fn main_effect_spec(outcome: &str, metric: &str) -> ModelSpec {
    let mut spec = device_metric_spec(outcome, metric);
    for flag in sequence_flags() {
        spec = spec.interaction(PRE_DX_CAT, flag);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_effect_formula() {
        insta::assert_snapshot!(
            main_effect_spec("dx_change", "artifact_burden").formula(),
            @"dx_change ~ C(device_cat) + mr_conditional + artifact_burden + lv_visibility_score + age + sex_male + hf + htn + cad + mi + afib + ckd + C(pre_dx_cat) + has_TFE + has_CINE + has_VIAB + C(device_cat):artifact_burden + C(device_cat):mr_conditional + C(pre_dx_cat):has_TFE + C(pre_dx_cat):has_CINE + C(pre_dx_cat):has_VIAB"
        );
    }
}
