//! Field-level coercion rules.
//!
//! Every function in this module is total: a malformed or missing input value
//! resolves to `None` or to a caller-supplied default and never to an error.
//! The column-level functions operate elementwise over a whole series; the
//! scalar functions are what the feature builder applies cell by cell.

use polars::prelude::{AnyValue, NamedFrom, Series};

use crate::polars::{any_to_f64, parse_f64};

/// Text tokens that read as a positive answer after trimming and case-folding.
const TRUE_TOKENS: [&str; 4] = ["yes", "y", "true", "1"];
/// Text tokens that read as a negative answer after trimming and case-folding.
const FALSE_TOKENS: [&str; 4] = ["no", "n", "false", "0"];

/// Converts a single cell to a number, or `None` when it cannot be parsed.
pub fn numeric_value(value: AnyValue<'_>) -> Option<f64> {
    any_to_f64(value)
}

/// Normalizes a single cell to 0 or 1.
///
/// Text is trimmed and case-folded, then matched against the yes/no token
/// lists; text that matches neither list is parsed as a number. Numbers
/// other than exactly 0 or 1 and anything still unresolved fall back to
/// `default`.
pub fn binary_value(value: AnyValue<'_>, default: i32) -> i32 {
    try_binary_value(value).unwrap_or(default)
}

/// Like [`binary_value`] but reports unresolved cells as `None`.
pub fn try_binary_value(value: AnyValue<'_>) -> Option<i32> {
    let numeric = match value {
        AnyValue::String(text) => lexical_binary(text),
        AnyValue::StringOwned(text) => lexical_binary(text.as_str()),
        other => numeric_value(other),
    };
    match numeric {
        Some(v) if v == 0.0 => Some(0),
        Some(v) if v == 1.0 => Some(1),
        _ => None,
    }
}

fn lexical_binary(text: &str) -> Option<f64> {
    let folded = text.trim().to_lowercase();
    if TRUE_TOKENS.contains(&folded.as_str()) {
        Some(1.0)
    } else if FALSE_TOKENS.contains(&folded.as_str()) {
        Some(0.0)
    } else {
        parse_f64(&folded)
    }
}

/// Divides two optional numbers, yielding `None` for a zero or missing
/// denominator or a missing numerator.
///
/// # Examples
///
/// ```
/// use cied_common::safe_ratio;
///
/// assert_eq!(safe_ratio(Some(5.0), Some(10.0)), Some(0.5));
/// assert_eq!(safe_ratio(Some(5.0), Some(0.0)), None);
/// assert_eq!(safe_ratio(Some(5.0), None), None);
/// ```
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    let quotient = numerator? / denominator;
    quotient.is_finite().then_some(quotient)
}

/// Converts a column to `Float64`; unparseable cells become null.
pub fn to_numeric(series: &Series) -> Series {
    let values: Vec<Option<f64>> = (0..series.len())
        .map(|idx| numeric_value(series.get(idx).unwrap_or(AnyValue::Null)))
        .collect();
    Series::new(series.name().clone(), values)
}

/// Converts a column to strictly 0/1 `Int32` values.
///
/// Textual columns go through the lexical stage first; every value left
/// unresolved becomes `default`.
pub fn to_binary(series: &Series, default: i32) -> Series {
    let values: Vec<i32> = (0..series.len())
        .map(|idx| binary_value(series.get(idx).unwrap_or(AnyValue::Null), default))
        .collect();
    Series::new(series.name().clone(), values)
}

/// Elementwise division that never produces an infinite value.
///
/// Both operands are numeric-coerced first. When the columns differ in
/// length the shorter one is treated as null past its end.
pub fn safe_divide(numerator: &Series, denominator: &Series) -> Series {
    let len = numerator.len().max(denominator.len());
    let values: Vec<Option<f64>> = (0..len)
        .map(|idx| {
            let num = numeric_value(numerator.get(idx).unwrap_or(AnyValue::Null));
            let den = numeric_value(denominator.get(idx).unwrap_or(AnyValue::Null));
            safe_ratio(num, den)
        })
        .collect();
    Series::new(numerator.name().clone(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;

    #[test]
    fn binary_value_reads_tokens() {
        for text in ["Yes", "yes", "Y", "TRUE", "1", " y "] {
            assert_eq!(binary_value(AnyValue::String(text), 0), 1, "{text}");
        }
        for text in ["No", "no", "N", "FALSE", "0"] {
            assert_eq!(binary_value(AnyValue::String(text), 1), 0, "{text}");
        }
    }

    #[test]
    fn binary_value_falls_back_to_default() {
        assert_eq!(binary_value(AnyValue::String("maybe"), 0), 0);
        assert_eq!(binary_value(AnyValue::String(""), 0), 0);
        assert_eq!(binary_value(AnyValue::Null, 0), 0);
        assert_eq!(binary_value(AnyValue::Float64(2.0), 0), 0);
        assert_eq!(try_binary_value(AnyValue::String("maybe")), None);
    }

    #[test]
    fn binary_value_parses_numeric_text() {
        assert_eq!(binary_value(AnyValue::String("1.0"), 0), 1);
        assert_eq!(binary_value(AnyValue::Int64(1), 0), 1);
        assert_eq!(binary_value(AnyValue::Float64(0.0), 1), 0);
    }

    #[test]
    fn to_numeric_nulls_unparseable() {
        let series = Series::new("age".into(), &["63", "n/a", " 70.5 "]);
        let numeric = to_numeric(&series);
        assert_eq!(numeric.dtype(), &DataType::Float64);
        assert_eq!(numeric.null_count(), 1);
        assert_eq!(numeric.name().as_str(), "age");
    }

    #[test]
    fn safe_divide_handles_zero_and_missing() {
        let num = Series::new("num".into(), &[Some(5.0), Some(1.0), Some(3.0), None]);
        let den = Series::new("den".into(), &[Some(10.0), Some(0.0), None, Some(2.0)]);
        let out = crate::series_f64_values(&safe_divide(&num, &den));
        assert_eq!(out, vec![Some(0.5), None, None, None]);
    }
}
