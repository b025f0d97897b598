//! Property checks for quantile binning.

use cied_stats::describe::{assign_bin, quantile, quantile_edges};
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use proptest::collection::vec;

proptest! {
    #[test]
    fn every_value_lands_in_a_bin(values in vec(-100.0f64..100.0, 1..60)) {
        let edges = quantile_edges(&values, 5);
        if edges.is_empty() {
            prop_assert!(values.iter().all(|v| *v == values[0]));
        } else {
            prop_assert!(edges.len() <= 6);
            for v in &values {
                let bin = assign_bin(*v, &edges);
                prop_assert!(bin.is_some());
                prop_assert!(bin.unwrap_or(usize::MAX) < edges.len() - 1);
            }
        }
    }

    #[test]
    fn quantiles_are_monotone(values in vec(-10.0f64..10.0, 1..40), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let qlo = quantile(&values, lo).unwrap_or(f64::NAN);
        let qhi = quantile(&values, hi).unwrap_or(f64::NAN);
        prop_assert!(qlo <= qhi + 1e-12);
        prop_assert_eq!(quantile(&values, 0.0), values.iter().copied().reduce(f64::min));
    }
}
