//! Per-sequence and cross-sequence derived metrics.

use cied_model::CauseAttribution;

/// Grade at or above which a sub-segment counts as severely obscured.
pub const SEVERE_SEGMENT_GRADE: f64 = 3.0;

/// Grade at or above which a sequence's overall artefact flag is set.
pub const SEVERE_ARTEFACT_GRADE: f64 = 1.0;

/// 1 when the overall artefact grade of a sequence is at least 1.
pub fn severe_artefact(grade: Option<f64>) -> i32 {
    i32::from(grade.is_some_and(|g| g >= SEVERE_ARTEFACT_GRADE))
}

/// 1 when any available sub-segment grade reaches the severe threshold.
///
/// Missing grades and an empty segment list both read as not severe.
pub fn wall_severity(grades: &[Option<f64>]) -> i32 {
    i32::from(
        grades
            .iter()
            .flatten()
            .any(|grade| *grade >= SEVERE_SEGMENT_GRADE),
    )
}

/// Clean-across-sequences flag for one wall.
///
/// The wall is clean only when no sequence rated it severe. `None` only
/// when there are no per-sequence severities at all.
pub fn clean_across(severities: &[i32]) -> Option<i32> {
    let worst = severities.iter().copied().max()?;
    Some(i32::from(worst < 1))
}

/// Number of clean walls; `None` only when every wall is undetermined.
pub fn visibility_score(clean: &[Option<i32>]) -> Option<i32> {
    let present: Vec<i32> = clean.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum())
    }
}

/// Mean of the present values; `None` when all are missing.
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Maximum of the present values; `None` when all are missing.
pub fn max_present(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::max)
}

/// Interprets the two cause codes of one sequence.
///
/// Primary code: 1 = IPG, 2 = lead, 3 = both, 0 = none. RV code: 1 = lead
/// alone, 2 = lead and device, 3 = neither, 4 = IPG.
pub fn attribute_cause(cause: Option<f64>, rv_cause: Option<f64>) -> CauseAttribution {
    let is = |code: Option<f64>, value: f64| code == Some(value);
    CauseAttribution {
        ipg: i32::from(is(cause, 1.0) || is(rv_cause, 4.0)),
        lead: i32::from(is(cause, 2.0) || is(rv_cause, 1.0) || is(rv_cause, 2.0)),
        both: i32::from(is(cause, 3.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_without_segments_is_not_severe() {
        assert_eq!(wall_severity(&[]), 0);
        assert_eq!(wall_severity(&[None, None]), 0);
        assert_eq!(wall_severity(&[Some(2.0), Some(3.0)]), 1);
        assert_eq!(wall_severity(&[Some(2.9)]), 0);
    }

    #[test]
    fn severe_artefact_threshold() {
        assert_eq!(severe_artefact(Some(1.0)), 1);
        assert_eq!(severe_artefact(Some(0.0)), 0);
        assert_eq!(severe_artefact(None), 0);
    }

    #[test]
    fn clean_across_sequences() {
        assert_eq!(clean_across(&[0, 0, 0]), Some(1));
        assert_eq!(clean_across(&[0, 1, 0]), Some(0));
        assert_eq!(clean_across(&[]), None);
    }

    #[test]
    fn visibility_score_min_count_rule() {
        assert_eq!(
            visibility_score(&[Some(1), Some(1), Some(0), Some(1)]),
            Some(3)
        );
        assert_eq!(visibility_score(&[None, None, None, None]), None);
        assert_eq!(visibility_score(&[Some(1), Some(0), None, None]), Some(1));
    }

    #[test]
    fn burden_skips_missing_ratios() {
        let burden = mean_present(&[Some(0.2), None, Some(0.6)]).unwrap();
        assert!((burden - 0.4).abs() < 1e-12);
        assert_eq!(mean_present(&[None, None, None]), None);
        assert_eq!(max_present(&[Some(0.2), None, Some(0.6)]), Some(0.6));
        assert_eq!(max_present(&[None, None, None]), None);
    }

    #[test]
    fn cause_codes_are_reconciled() {
        assert_eq!(
            attribute_cause(Some(1.0), None),
            CauseAttribution { ipg: 1, lead: 0, both: 0 }
        );
        assert_eq!(
            attribute_cause(None, Some(4.0)),
            CauseAttribution { ipg: 1, lead: 0, both: 0 }
        );
        assert_eq!(
            attribute_cause(Some(0.0), Some(2.0)),
            CauseAttribution { ipg: 0, lead: 1, both: 0 }
        );
        assert_eq!(
            attribute_cause(Some(3.0), Some(3.0)),
            CauseAttribution { ipg: 0, lead: 0, both: 1 }
        );
    }
}
