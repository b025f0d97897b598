//! Property tests for the cross-sequence composites.

use cied_transform::composites::{
    clean_across, max_present, mean_present, visibility_score, wall_severity,
};
use proptest::prelude::*;

fn ratio() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of(0.0f64..10.0)
}

proptest! {
    #[test]
    fn burden_lies_between_present_extremes(ratios in proptest::collection::vec(ratio(), 3)) {
        let present: Vec<f64> = ratios.iter().flatten().copied().collect();
        match mean_present(&ratios) {
            None => prop_assert!(present.is_empty()),
            Some(mean) => {
                let max = max_present(&ratios).unwrap();
                let min = present.iter().copied().fold(f64::INFINITY, f64::min);
                prop_assert!(mean <= max + 1e-9);
                prop_assert!(mean >= min - 1e-9);
            }
        }
    }

    #[test]
    fn visibility_score_is_null_only_when_all_null(
        clean in proptest::collection::vec(proptest::option::of(0i32..=1), 4)
    ) {
        let score = visibility_score(&clean);
        prop_assert_eq!(score.is_none(), clean.iter().all(Option::is_none));
        if let Some(score) = score {
            prop_assert!((0..=4).contains(&score));
        }
    }

    #[test]
    fn severity_and_cleanliness_are_binary(
        grades in proptest::collection::vec(proptest::option::of(0.0f64..4.0), 0..6),
        severities in proptest::collection::vec(0i32..=1, 1..4),
    ) {
        prop_assert!(matches!(wall_severity(&grades), 0 | 1));
        prop_assert!(matches!(clean_across(&severities), Some(0 | 1)));
    }
}
