//! Header disambiguation and normalization.

use std::collections::{HashMap, HashSet};

/// Collapses internal whitespace runs to one space and trims the ends.
///
/// Used only for tolerant lookups; loaded column names keep their exact
/// source text.
pub fn normalize_header(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Makes raw header names unique.
///
/// Blank names become `Unnamed: {index}`. The second occurrence of `X`
/// becomes `X.1`, the third `X.2` and so on, skipping suffixes that are
/// already taken by another header.
pub fn mangle_headers(raw: &[String]) -> Vec<String> {
    let named: Vec<String> = raw
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.clone()
            }
        })
        .collect();

    let mut taken: HashSet<String> = named.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(named.len());

    for name in named {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            out.push(name);
            continue;
        }
        let mut suffix = *count;
        let mut candidate = format!("{name}.{suffix}");
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}.{suffix}");
        }
        *count = suffix + 1;
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  MR Conditional "), "MR Conditional");
        assert_eq!(normalize_header("PPM  to\tLV Apex"), "PPM to LV Apex");
    }

    #[test]
    fn test_mangle_duplicates() {
        let out = mangle_headers(&names(&["A", "A", "B", "A"]));
        assert_eq!(out, names(&["A", "A.1", "B", "A.2"]));
    }

    #[test]
    fn test_mangle_skips_taken_suffix() {
        let out = mangle_headers(&names(&["A", "A.1", "A"]));
        assert_eq!(out, names(&["A", "A.1", "A.2"]));
    }

    #[test]
    fn test_mangle_blank_headers() {
        let out = mangle_headers(&names(&["Age", "", "  "]));
        assert_eq!(out, names(&["Age", "Unnamed: 1", "Unnamed: 2"]));
    }

    #[test]
    fn test_mangle_keeps_trailing_space_distinct() {
        let out = mangle_headers(&names(&["MR Conditional ", "MR Conditional"]));
        assert_eq!(out, names(&["MR Conditional ", "MR Conditional"]));
    }
}
