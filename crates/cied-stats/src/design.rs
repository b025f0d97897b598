//! Model specifications, complete-case model frames and design matrices.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cied_common::{any_to_string, series_f64_values};
use nalgebra::{DMatrix, DVector};
use polars::prelude::{AnyValue, DataFrame, DataType};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// One right-hand-side term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Numeric(String),
    /// Treatment-coded factor; the first level in sorted order is the
    /// reference.
    Categorical(String),
    /// Factor-by-numeric slope interaction.
    Interaction { categorical: String, numeric: String },
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Numeric(name) => write!(f, "{name}"),
            Term::Categorical(name) => write!(f, "C({name})"),
            Term::Interaction {
                categorical,
                numeric,
            } => write!(f, "C({categorical}):{numeric}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Logistic regression.
    Binomial,
    /// Linear regression.
    Gaussian,
}

/// Outcome, terms and family of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub outcome: String,
    pub terms: Vec<Term>,
    pub family: Family,
}

impl ModelSpec {
    pub fn logit(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            terms: Vec::new(),
            family: Family::Binomial,
        }
    }

    pub fn ols(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            terms: Vec::new(),
            family: Family::Gaussian,
        }
    }

    pub fn numeric(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::Numeric(name.into()));
        self
    }

    pub fn numerics(mut self, names: &[&str]) -> Self {
        self.terms
            .extend(names.iter().map(|n| Term::Numeric((*n).to_string())));
        self
    }

    pub fn categorical(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::Categorical(name.into()));
        self
    }

    pub fn interaction(mut self, categorical: impl Into<String>, numeric: impl Into<String>) -> Self {
        self.terms.push(Term::Interaction {
            categorical: categorical.into(),
            numeric: numeric.into(),
        });
        self
    }

    /// Formula text, e.g. `y ~ C(device_cat) + age`.
    pub fn formula(&self) -> String {
        let rhs: Vec<String> = self.terms.iter().map(ToString::to_string).collect();
        if rhs.is_empty() {
            format!("{} ~ 1", self.outcome)
        } else {
            format!("{} ~ {}", self.outcome, rhs.join(" + "))
        }
    }

    /// Numeric predictors in first-use order.
    pub fn numeric_predictors(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for term in &self.terms {
            let name = match term {
                Term::Numeric(name) => name,
                Term::Interaction { numeric, .. } => numeric,
                Term::Categorical(_) => continue,
            };
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }

    /// Factor predictors in first-use order.
    pub fn categorical_predictors(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for term in &self.terms {
            let name = match term {
                Term::Categorical(name) => name,
                Term::Interaction { categorical, .. } => categorical,
                Term::Numeric(_) => continue,
            };
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }

    /// Every column the model reads, outcome first.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = vec![self.outcome.as_str()];
        for name in self
            .numeric_predictors()
            .into_iter()
            .chain(self.categorical_predictors())
        {
            if !vars.contains(&name) {
                vars.push(name);
            }
        }
        vars
    }
}

/// Complete-case slice of a dataset for a set of variables.
///
/// Numeric variables are held as `f64`, factor variables as their text
/// levels. Rows missing any requested variable are dropped; the source row
/// indices of the survivors are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFrame {
    rows: Vec<usize>,
    numeric: BTreeMap<String, Vec<f64>>,
    categorical: BTreeMap<String, Vec<String>>,
}

fn is_text(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

impl ModelFrame {
    pub fn from_dataframe(df: &DataFrame, numeric: &[&str], categorical: &[&str]) -> Result<Self> {
        let height = df.height();
        let mut keep = vec![true; height];
        let mut numeric_values = Vec::with_capacity(numeric.len());
        let mut categorical_values = Vec::with_capacity(categorical.len());

        for &name in numeric {
            let column = df.column(name).map_err(|_| FitError::MissingColumn {
                variable: name.to_string(),
            })?;
            let series = column.as_materialized_series();
            if is_text(series.dtype()) {
                return Err(FitError::NonNumeric {
                    variable: name.to_string(),
                });
            }
            let values = series_f64_values(series);
            for (flag, value) in keep.iter_mut().zip(&values) {
                *flag &= value.is_some();
            }
            numeric_values.push((name, values));
        }

        for &name in categorical {
            let column = df.column(name).map_err(|_| FitError::MissingColumn {
                variable: name.to_string(),
            })?;
            let series = column.as_materialized_series();
            let values: Vec<Option<String>> = (0..height)
                .map(|idx| match series.get(idx).unwrap_or(AnyValue::Null) {
                    AnyValue::Null => None,
                    value => Some(any_to_string(value)).filter(|s| !s.is_empty()),
                })
                .collect();
            for (flag, value) in keep.iter_mut().zip(&values) {
                *flag &= value.is_some();
            }
            categorical_values.push((name, values));
        }

        let rows: Vec<usize> = (0..height).filter(|&idx| keep[idx]).collect();
        let numeric = numeric_values
            .into_iter()
            .map(|(name, values)| {
                let kept = rows.iter().filter_map(|&idx| values[idx]).collect();
                (name.to_string(), kept)
            })
            .collect();
        let categorical = categorical_values
            .into_iter()
            .map(|(name, values)| {
                let kept = rows
                    .iter()
                    .filter_map(|&idx| values[idx].clone())
                    .collect();
                (name.to_string(), kept)
            })
            .collect();

        Ok(Self {
            rows,
            numeric,
            categorical,
        })
    }

    /// Complete cases over every variable `spec` reads.
    pub fn for_spec(df: &DataFrame, spec: &ModelSpec) -> Result<Self> {
        let mut numeric = vec![spec.outcome.as_str()];
        numeric.extend(
            spec.numeric_predictors()
                .into_iter()
                .filter(|name| *name != spec.outcome),
        );
        Self::from_dataframe(df, &numeric, &spec.categorical_predictors())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source row index of every kept row.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        self.numeric
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FitError::MissingColumn {
                variable: name.to_string(),
            })
    }

    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        self.categorical
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FitError::MissingColumn {
                variable: name.to_string(),
            })
    }

    /// Copy with `name` replaced (or added) as a numeric variable.
    pub fn with_numeric(&self, name: &str, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.len());
        let mut frame = self.clone();
        frame.numeric.insert(name.to_string(), values);
        frame
    }

    /// Copy with every row of `name` set to `value`.
    pub fn with_constant(&self, name: &str, value: f64) -> Self {
        self.with_numeric(name, vec![value; self.len()])
    }

    /// Copy with every row of factor `name` set to `level`.
    pub fn with_level(&self, name: &str, level: &str) -> Self {
        let mut frame = self.clone();
        frame
            .categorical
            .insert(name.to_string(), vec![level.to_string(); self.len()]);
        frame
    }

    /// Rows where `keep` is true.
    pub fn filter(&self, keep: &[bool]) -> Self {
        let pick = |len: usize| -> Vec<usize> { (0..len).filter(|&i| keep[i]).collect() };
        let idx = pick(self.len());
        Self {
            rows: idx.iter().map(|&i| self.rows[i]).collect(),
            numeric: self
                .numeric
                .iter()
                .map(|(k, v)| (k.clone(), idx.iter().map(|&i| v[i]).collect()))
                .collect(),
            categorical: self
                .categorical
                .iter()
                .map(|(k, v)| (k.clone(), idx.iter().map(|&i| v[i].clone()).collect()))
                .collect(),
        }
    }
}

/// Orders numeric-looking levels by value, everything else lexically.
pub fn compare_levels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Intercept,
    Numeric(String),
    Level { variable: String, level: String },
    Slope {
        variable: String,
        level: String,
        numeric: String,
    },
}

/// Maps model frames to design matrices with a fixed column layout.
///
/// Factor levels are learned from the fitting frame; predicting on a frame
/// with an unseen level is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignEncoder {
    columns: Vec<Column>,
    levels: BTreeMap<String, Vec<String>>,
}

impl DesignEncoder {
    pub fn new(spec: &ModelSpec, frame: &ModelFrame) -> Result<Self> {
        let mut levels = BTreeMap::new();
        for name in spec.categorical_predictors() {
            let unique: BTreeSet<&String> = frame.categorical(name)?.iter().collect();
            let mut sorted: Vec<String> = unique.into_iter().cloned().collect();
            sorted.sort_by(|a, b| compare_levels(a, b));
            levels.insert(name.to_string(), sorted);
        }

        let main_numeric: BTreeSet<&str> = spec
            .terms
            .iter()
            .filter_map(|t| match t {
                Term::Numeric(n) => Some(n.as_str()),
                _ => None,
            })
            .collect();

        let mut columns = vec![Column::Intercept];
        for term in &spec.terms {
            match term {
                Term::Numeric(name) => columns.push(Column::Numeric(name.clone())),
                Term::Categorical(name) => {
                    for level in levels[name].iter().skip(1) {
                        columns.push(Column::Level {
                            variable: name.clone(),
                            level: level.clone(),
                        });
                    }
                }
                Term::Interaction {
                    categorical,
                    numeric,
                } => {
                    // Without the numeric main effect every level gets its own slope.
                    let skip = usize::from(main_numeric.contains(numeric.as_str()));
                    for level in levels[categorical].iter().skip(skip) {
                        columns.push(Column::Slope {
                            variable: categorical.clone(),
                            level: level.clone(),
                            numeric: numeric.clone(),
                        });
                    }
                }
            }
        }
        Ok(Self { columns, levels })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column names: `Intercept`, `x`, `C(f)[T.b]`, `C(f)[T.b]:x`.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| match c {
                Column::Intercept => "Intercept".to_string(),
                Column::Numeric(name) => name.clone(),
                Column::Level { variable, level } => format!("C({variable})[T.{level}]"),
                Column::Slope {
                    variable,
                    level,
                    numeric,
                } => format!("C({variable})[T.{level}]:{numeric}"),
            })
            .collect()
    }

    /// Index of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.column_names().iter().position(|c| c == name)
    }

    pub fn levels(&self, variable: &str) -> Option<&[String]> {
        self.levels.get(variable).map(Vec::as_slice)
    }

    /// Rows whose factor levels were all seen during fitting.
    pub fn known_rows(&self, frame: &ModelFrame) -> Result<Vec<bool>> {
        let mut keep = vec![true; frame.len()];
        for (name, known) in &self.levels {
            for (flag, value) in keep.iter_mut().zip(frame.categorical(name)?) {
                *flag &= known.contains(value);
            }
        }
        Ok(keep)
    }

    fn check_levels(&self, frame: &ModelFrame) -> Result<()> {
        for (name, known) in &self.levels {
            if let Some(level) = frame.categorical(name)?.iter().find(|v| !known.contains(v)) {
                return Err(FitError::UnknownLevel {
                    variable: name.clone(),
                    level: level.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn matrix(&self, frame: &ModelFrame) -> Result<DMatrix<f64>> {
        self.check_levels(frame)?;
        let n = frame.len();
        let mut x = DMatrix::zeros(n, self.columns.len());
        for (j, column) in self.columns.iter().enumerate() {
            match column {
                Column::Intercept => x.column_mut(j).fill(1.0),
                Column::Numeric(name) => {
                    for (i, v) in frame.numeric(name)?.iter().enumerate() {
                        x[(i, j)] = *v;
                    }
                }
                Column::Level { variable, level } => {
                    for (i, v) in frame.categorical(variable)?.iter().enumerate() {
                        x[(i, j)] = if v == level { 1.0 } else { 0.0 };
                    }
                }
                Column::Slope {
                    variable,
                    level,
                    numeric,
                } => {
                    let factor = frame.categorical(variable)?;
                    let values = frame.numeric(numeric)?;
                    for i in 0..n {
                        x[(i, j)] = if &factor[i] == level { values[i] } else { 0.0 };
                    }
                }
            }
        }
        Ok(x)
    }
}

/// Response vector of `outcome` from a frame.
pub fn response(frame: &ModelFrame, outcome: &str) -> Result<DVector<f64>> {
    Ok(DVector::from_column_slice(frame.numeric(outcome)?))
}
