//! Canonical column names and their storage kinds.
//!
//! The column list returned by [`canonical_columns`] is the single source of
//! truth for output order and for the dtypes the dataset store enforces when
//! reading either snapshot format.

use serde::{Deserialize, Serialize};

use crate::enums::{Sequence, Wall};

/// Storage kind of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// 0/1 integer, never null.
    Flag,
    /// Integer that may be null.
    Count,
    /// Continuous measurement that may be null.
    Float,
    /// Raw integer code kept as a number; may be null.
    Code,
    /// Named category; may be null.
    Category,
}

impl ColumnKind {
    pub fn is_nullable(&self) -> bool {
        !matches!(self, ColumnKind::Flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl CanonicalColumn {
    fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

pub const AGE: &str = "age";
pub const SEX_MALE: &str = "sex_male";
pub const HEIGHT_CM: &str = "height_cm";
pub const WEIGHT_KG: &str = "weight_kg";
pub const BMI: &str = "bmi";

pub const HF: &str = "hf";
pub const HTN: &str = "htn";
pub const CAD: &str = "cad";
pub const MI: &str = "mi";
pub const VT_VF: &str = "vt_vf";
pub const VFIB: &str = "vfib";
pub const VT: &str = "vt";
pub const AFIB: &str = "afib";
pub const CKD: &str = "ckd";

pub const PRE_DX_CAT: &str = "pre_dx_cat";
pub const POST_DX_CAT: &str = "post_dx_cat";
pub const PRE_DX_NAME: &str = "pre_dx_name";
pub const POST_DX_NAME: &str = "post_dx_name";

pub const DEVICE_TYPE_CODE: &str = "device_type_code";
pub const DEVICE_CAT: &str = "device_cat";
pub const IS_CRT: &str = "is_CRT";
pub const ICD_INDICATION_CODE: &str = "icd_indication_code";
pub const PPM_INDICATION_CODE: &str = "ppm_indication_code";
pub const INDICATION_MISSING: &str = "indication_missing";
pub const MR_CONDITIONAL: &str = "mr_conditional";
pub const POSITION_BODY_CODE: &str = "position_body_code";
pub const LEFT_CHEST: &str = "left_chest";
pub const RIGHT_CHEST: &str = "right_chest";
pub const LEADLESS: &str = "leadless";
pub const SUBQ_POSITION: &str = "subQ";
pub const LEFT_VS_OTHER: &str = "left_vs_other";
pub const LEFT_VS_OTHER_COARSE: &str = "left_vs_other_coarse";
pub const MANUFACTURER_CODE: &str = "manufacturer_code";
pub const MANUFACTURER_NAME: &str = "manufacturer_name";
pub const MANUFACTURER_OTHER: &str = "manufacturer_other";
pub const ATRIAL_LEAD: &str = "atrial_lead";
pub const VENTRICULAR_LEAD: &str = "ventricular_lead";
pub const LV_LEAD: &str = "lv_lead";
pub const SUBQ_LEAD: &str = "subq_lead";
pub const N_LEADS: &str = "n_leads";
pub const HAS_LV: &str = "has_LV";
pub const HAS_SQ: &str = "has_SQ";

pub const ROTATION: &str = "rotation";
pub const DIST_CARD_SIL_MM: &str = "dist_card_sil_mm";
pub const DIST_LV_APEX_MM: &str = "dist_lv_apex_mm";
pub const WIDEST_CHEST_MM: &str = "widest_chest_mm";
pub const NORM_DIST_CARD_SIL: &str = "norm_dist_card_sil";
pub const NORM_DIST_LV_APEX: &str = "norm_dist_LV_apex";

pub const ARTIFACT_BURDEN: &str = "artifact_burden";
pub const MAX_RATIO: &str = "max_ratio";
pub const LV_VISIBILITY_SCORE: &str = "lv_visibility_score";

pub const CAUSE_IPG: &str = "cause_IPG";
pub const CAUSE_LEAD: &str = "cause_lead";
pub const CAUSE_BOTH: &str = "cause_both";

pub const NON_DIAGNOSTIC: &str = "NonDiagnostic";
pub const ADD_INFO: &str = "AddInfo";
pub const CONFIRMED: &str = "Confirmed";
pub const MGMT_CHANGE: &str = "MgmtChange";
pub const DX_CHANGE: &str = "dx_change";
pub const UTILITY_SCORE: &str = "UtilityScore";

/// `severe_art_{SEQ}`
pub fn severe_art_column(sequence: Sequence) -> String {
    format!("severe_art_{}", sequence.label())
}

/// `ratio_{SEQ}`
pub fn ratio_column(sequence: Sequence) -> String {
    format!("ratio_{}", sequence.label())
}

/// `{wall}_severe_{SEQ}`
pub fn wall_severe_column(wall: Wall, sequence: Sequence) -> String {
    format!("{}_severe_{}", wall.as_str(), sequence.label())
}

/// `lv_{wall}_clean_{SEQ}`
pub fn wall_clean_column(wall: Wall, sequence: Sequence) -> String {
    format!("lv_{}_clean_{}", wall.as_str(), sequence.label())
}

/// `lv_{wall}_clean`, the across-sequence flag.
pub fn wall_clean_overall_column(wall: Wall) -> String {
    format!("lv_{}_clean", wall.as_str())
}

/// `has_{SEQ}`
pub fn has_sequence_column(sequence: Sequence) -> String {
    format!("has_{}", sequence.label())
}

/// Every canonical column, in output order.
pub fn canonical_columns() -> Vec<CanonicalColumn> {
    use ColumnKind::{Category, Code, Count, Flag, Float};

    let mut columns = Vec::with_capacity(97);
    let mut push = |name: &str, kind: ColumnKind| columns.push(CanonicalColumn::new(name, kind));

    push(AGE, Float);
    push(SEX_MALE, Flag);
    push(HEIGHT_CM, Float);
    push(WEIGHT_KG, Float);
    push(BMI, Float);
    for name in [HF, HTN, CAD, MI, VT_VF, VFIB, VT, AFIB, CKD] {
        push(name, Flag);
    }

    push(PRE_DX_CAT, Code);
    push(POST_DX_CAT, Code);
    push(PRE_DX_NAME, Category);
    push(POST_DX_NAME, Category);

    push(DEVICE_TYPE_CODE, Code);
    push(DEVICE_CAT, Category);
    push(IS_CRT, Flag);
    push(ICD_INDICATION_CODE, Code);
    push(PPM_INDICATION_CODE, Code);
    push(INDICATION_MISSING, Flag);
    push(MR_CONDITIONAL, Flag);
    push(POSITION_BODY_CODE, Code);
    for name in [LEFT_CHEST, RIGHT_CHEST, LEADLESS, SUBQ_POSITION] {
        push(name, Flag);
    }
    push(LEFT_VS_OTHER, Flag);
    push(LEFT_VS_OTHER_COARSE, Flag);
    push(MANUFACTURER_CODE, Code);
    push(MANUFACTURER_NAME, Category);
    push(MANUFACTURER_OTHER, Flag);
    for name in [ATRIAL_LEAD, VENTRICULAR_LEAD, LV_LEAD, SUBQ_LEAD] {
        push(name, Flag);
    }
    push(N_LEADS, Count);
    push(HAS_LV, Flag);
    push(HAS_SQ, Flag);

    push(ROTATION, Flag);
    for name in [
        DIST_CARD_SIL_MM,
        DIST_LV_APEX_MM,
        WIDEST_CHEST_MM,
        NORM_DIST_CARD_SIL,
        NORM_DIST_LV_APEX,
    ] {
        push(name, Float);
    }

    for sequence in Sequence::ALL {
        push(&severe_art_column(sequence), Flag);
        push(&ratio_column(sequence), Float);
        for wall in Wall::ALL {
            push(&wall_severe_column(wall, sequence), Flag);
            push(&wall_clean_column(wall, sequence), Flag);
        }
    }

    push(ARTIFACT_BURDEN, Float);
    push(MAX_RATIO, Float);
    for wall in Wall::ALL {
        push(&wall_clean_overall_column(wall), Count);
    }
    push(LV_VISIBILITY_SCORE, Count);

    for name in [CAUSE_IPG, CAUSE_LEAD, CAUSE_BOTH] {
        push(name, Flag);
    }
    for sequence in Sequence::ALL {
        push(&has_sequence_column(sequence), Flag);
    }

    for name in [NON_DIAGNOSTIC, ADD_INFO, CONFIRMED, MGMT_CHANGE, DX_CHANGE] {
        push(name, Flag);
    }
    push(UTILITY_SCORE, Count);

    columns
}

/// Looks up the kind of a canonical column by name.
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    canonical_columns()
        .into_iter()
        .find(|column| column.name == name)
        .map(|column| column.kind)
}
