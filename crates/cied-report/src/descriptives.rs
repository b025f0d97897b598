//! Baseline characteristics and outcome rates by device category.

use cied_common::{any_to_f64, any_to_string};
use cied_model::StageReport;
use cied_model::columns::{
    ADD_INFO, AFIB, AGE, ARTIFACT_BURDEN, BMI, CAD, CKD, CONFIRMED, DEVICE_CAT, DX_CHANGE, HF,
    HTN, LEFT_VS_OTHER, LV_VISIBILITY_SCORE, MANUFACTURER_OTHER, MGMT_CHANGE, MI, MR_CONDITIONAL,
    N_LEADS, NON_DIAGNOSTIC, NORM_DIST_CARD_SIL, NORM_DIST_LV_APEX, ROTATION, SEX_MALE,
};
use polars::prelude::{DataFrame, DataType, Expr, IntoLazy, SortMultipleOptions, col};

use crate::attempt::run_attempt;
use crate::error::{ReportError, Result};
use crate::settings::StageContext;
use crate::table::{CsvTable, write_frame};
use crate::vars::sequence_flags;

pub const TABLE1_FILE: &str = "table1_by_device.csv";
pub const TABLE2_FILE: &str = "table2_outcomes_by_device.csv";

const TABLE2_OUTCOMES: [&str; 5] = [DX_CHANGE, MGMT_CHANGE, ADD_INFO, NON_DIAGNOSTIC, CONFIRMED];

fn table1_variables() -> Vec<String> {
    let mut vars: Vec<String> = [
        AGE,
        SEX_MALE,
        BMI,
        HF,
        HTN,
        CAD,
        MI,
        AFIB,
        CKD,
        MR_CONDITIONAL,
        N_LEADS,
        LEFT_VS_OTHER,
        MANUFACTURER_OTHER,
        NORM_DIST_CARD_SIL,
        NORM_DIST_LV_APEX,
        ROTATION,
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    vars.extend(sequence_flags());
    vars.push(ARTIFACT_BURDEN.to_string());
    vars.push(LV_VISIBILITY_SCORE.to_string());
    vars
}

fn require_device(df: &DataFrame) -> Result<()> {
    df.column(DEVICE_CAT)
        .map(|_| ())
        .map_err(|_| ReportError::MissingColumn {
            column: DEVICE_CAT.to_string(),
        })
}

fn grouped(df: &DataFrame, aggs: Vec<Expr>) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(DEVICE_CAT).is_not_null())
        .group_by([col(DEVICE_CAT)])
        .agg(aggs)
        .sort([DEVICE_CAT], SortMultipleOptions::default())
        .collect()?)
}

/// Count, mean, sample std, min and max per device for every available
/// baseline variable; columns are named `{var}_{stat}`.
pub fn table1(df: &DataFrame) -> Result<DataFrame> {
    require_device(df)?;
    let mut aggs = Vec::new();
    for var in table1_variables()
        .iter()
        .filter(|v| df.column(v.as_str()).is_ok())
    {
        let x = col(var.as_str()).cast(DataType::Float64);
        aggs.push(x.clone().count().alias(format!("{var}_count")));
        aggs.push(x.clone().mean().alias(format!("{var}_mean")));
        aggs.push(x.clone().std(1).alias(format!("{var}_std")));
        aggs.push(x.clone().min().alias(format!("{var}_min")));
        aggs.push(x.max().alias(format!("{var}_max")));
    }
    grouped(df, aggs)
}

fn cell(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column)
        .ok()
        .and_then(|c| c.get(row).ok())
        .and_then(any_to_f64)
}

/// `events (rate%)` per device for each binary outcome; the rate uses the
/// non-missing count as denominator.
pub fn table2(df: &DataFrame) -> Result<CsvTable> {
    require_device(df)?;
    let outcomes: Vec<&str> = TABLE2_OUTCOMES
        .into_iter()
        .filter(|o| df.column(o).is_ok())
        .collect();
    let mut aggs = Vec::with_capacity(outcomes.len() * 2);
    for outcome in &outcomes {
        let x = col(*outcome).cast(DataType::Float64);
        aggs.push(x.clone().sum().alias(format!("{outcome}_events")));
        aggs.push(x.count().alias(format!("{outcome}_n")));
    }
    let summary = grouped(df, aggs)?;

    let mut headers = vec![DEVICE_CAT];
    headers.extend(&outcomes);
    let mut table = CsvTable::new(&headers);
    let devices = summary.column(DEVICE_CAT)?;
    for row in 0..summary.height() {
        let mut cells = vec![any_to_string(devices.get(row)?)];
        for outcome in &outcomes {
            let events = cell(&summary, &format!("{outcome}_events"), row).unwrap_or(0.0);
            let n = cell(&summary, &format!("{outcome}_n"), row).unwrap_or(0.0);
            cells.push(if n > 0.0 {
                format!("{events:.0} ({:.1}%)", 100.0 * events / n)
            } else {
                String::new()
            });
        }
        table.push(cells);
    }
    Ok(table)
}

pub fn run_descriptives(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("describe");
    run_attempt(
        &mut report,
        "table1_by_device",
        ctx.layout.table(TABLE1_FILE),
        |path| {
            let mut table = table1(df)?;
            write_frame(&mut table, path)?;
            Ok(())
        },
    );
    run_attempt(
        &mut report,
        "table2_outcomes_by_device",
        ctx.layout.table(TABLE2_FILE),
        |path| Ok(table2(df)?.write(path)?),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom, Series};

    fn cohort() -> DataFrame {
        DataFrame::new(vec![
            Column::from(Series::new(
                DEVICE_CAT.into(),
                &[Some("PPM"), Some("ICD"), Some("PPM"), None, Some("ICD")],
            )),
            Column::from(Series::new(AGE.into(), &[Some(70.0), Some(60.0), Some(80.0), Some(50.0), None])),
            Column::from(Series::new(DX_CHANGE.into(), &[Some(1), Some(0), Some(0), Some(1), None])),
        ])
        .unwrap()
    }

    #[test]
    fn table1_groups_by_device() {
        let t = table1(&cohort()).unwrap();
        assert_eq!(t.height(), 2);
        let names: Vec<String> = t.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["device_cat", "age_count", "age_mean", "age_std", "age_min", "age_max"]
        );
        assert_eq!(cell(&t, "age_count", 0), Some(1.0));
        assert_eq!(cell(&t, "age_mean", 1), Some(75.0));
        let std = cell(&t, "age_std", 1).unwrap();
        assert!((std - 50f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn table2_formats_rates() {
        let t = table2(&cohort()).unwrap();
        assert_eq!(t.headers(), &["device_cat".to_string(), "dx_change".to_string()]);
        assert_eq!(
            t.rows(),
            &[
                vec!["ICD".to_string(), "0 (0.0%)".to_string()],
                vec!["PPM".to_string(), "1 (50.0%)".to_string()],
            ]
        );
    }

    #[test]
    fn device_column_is_required() {
        let df = DataFrame::new(vec![Column::from(Series::new(AGE.into(), &[1.0]))]).unwrap();
        assert!(matches!(table1(&df), Err(ReportError::MissingColumn { .. })));
    }
}
