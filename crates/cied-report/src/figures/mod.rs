//! Dose-response and density figures.

mod chart;
mod raster;

use std::collections::BTreeMap;

use cied_model::columns::{ARTIFACT_BURDEN, DEVICE_CAT, DX_CHANGE, ratio_column};
use cied_model::{Sequence, StageReport};
use cied_stats::describe::{GaussianKde, assign_bin, bin_label, mean, quantile_edges};
use cied_stats::{ModelFrame, compare_levels};
use polars::prelude::DataFrame;

use crate::attempt::{run_attempt, skip_attempt};
use crate::error::{AttemptError, Result};
use crate::settings::StageContext;

pub use chart::{Chart, Style, Trace};
pub use raster::{FIGURE_HEIGHT, FIGURE_WIDTH, Rasterizer};

pub const DOSE_RESPONSE_FIGURE: &str = "dose_response_dx_change.png";
pub const RIDGE_FIGURE: &str = "ridge_ratio_TFE.png";

const QUINTILES: usize = 5;
const DENSITY_POINTS: usize = 200;

/// Groups the rows of a frame by device level in sorted order.
fn by_device(frame: &ModelFrame) -> std::result::Result<BTreeMap<String, Vec<usize>>, AttemptError> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, device) in frame.categorical(DEVICE_CAT)?.iter().enumerate() {
        groups.entry(device.clone()).or_default().push(i);
    }
    Ok(groups)
}

fn sorted_levels(groups: &BTreeMap<String, Vec<usize>>) -> Vec<&String> {
    let mut levels: Vec<&String> = groups.keys().collect();
    levels.sort_by(|a, b| compare_levels(a, b));
    levels
}

/// Mean dx_change per device within artifact_burden quintile bins.
pub fn dose_response_chart(df: &DataFrame) -> std::result::Result<Chart, AttemptError> {
    let frame = ModelFrame::from_dataframe(df, &[ARTIFACT_BURDEN, DX_CHANGE], &[DEVICE_CAT])?;
    let burden = frame.numeric(ARTIFACT_BURDEN)?;
    let outcome = frame.numeric(DX_CHANGE)?;
    let edges = quantile_edges(burden, QUINTILES);
    let bins = edges.len().saturating_sub(1);
    let groups = by_device(&frame)?;

    let traces = sorted_levels(&groups)
        .into_iter()
        .map(|device| {
            let mut per_bin: Vec<Vec<f64>> = vec![Vec::new(); bins];
            for &i in &groups[device] {
                if let Some(bin) = assign_bin(burden[i], &edges) {
                    per_bin[bin].push(outcome[i]);
                }
            }
            let points = per_bin
                .iter()
                .enumerate()
                .filter_map(|(bin, values)| mean(values).map(|m| (bin as f64, m)))
                .collect();
            Trace {
                label: device.clone(),
                points,
            }
        })
        .collect();

    Ok(Chart {
        x_label: "artifact_burden quintile".to_string(),
        y_label: "Pr(ΔDx=1)".to_string(),
        style: Style::LineWithMarkers,
        x_categories: Some((0..bins).map(|i| bin_label(&edges, i)).collect()),
        traces,
    })
}

/// Kernel density of ratio_TFE per device, each normalised on its own.
pub fn ridge_chart(df: &DataFrame) -> std::result::Result<Chart, AttemptError> {
    let ratio = ratio_column(Sequence::Tfe);
    let frame = ModelFrame::from_dataframe(df, &[ratio.as_str()], &[DEVICE_CAT])?;
    let values = frame.numeric(&ratio)?;
    let groups = by_device(&frame)?;

    let traces = sorted_levels(&groups)
        .into_iter()
        .filter_map(|device| {
            let sample: Vec<f64> = groups[device].iter().map(|&i| values[i]).collect();
            let kde = GaussianKde::new(&sample)?;
            let points = kde
                .support(DENSITY_POINTS)
                .into_iter()
                .map(|x| (x, kde.evaluate(x)))
                .collect();
            Some(Trace {
                label: device.clone(),
                points,
            })
        })
        .collect();

    Ok(Chart {
        x_label: ratio,
        y_label: "Density".to_string(),
        style: Style::FilledArea,
        x_categories: None,
        traces,
    })
}

fn missing_columns(df: &DataFrame, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| df.column(c).is_err())
        .map(|c| (*c).to_string())
        .collect()
}

type ChartBuilder = fn(&DataFrame) -> std::result::Result<Chart, AttemptError>;

pub fn run_figures(df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let mut report = StageReport::new("figures");
    let rasterizer = Rasterizer::new();
    let ratio = ratio_column(Sequence::Tfe);

    let figures: [(&str, &str, Vec<&str>, ChartBuilder); 2] = [
        (
            "dose_response_dx_change",
            DOSE_RESPONSE_FIGURE,
            vec![ARTIFACT_BURDEN, DX_CHANGE, DEVICE_CAT],
            dose_response_chart,
        ),
        (
            "ridge_ratio_TFE",
            RIDGE_FIGURE,
            vec![ratio.as_str(), DEVICE_CAT],
            ridge_chart,
        ),
    ];

    for (key, file_name, required, build) in figures {
        let missing = missing_columns(df, &required);
        if !missing.is_empty() {
            skip_attempt(
                &mut report,
                key,
                &format!("missing columns: {}", missing.join(", ")),
            );
            continue;
        }
        run_attempt(&mut report, key, ctx.layout.figure(file_name), |path| {
            let chart = build(df)?;
            Ok(rasterizer.save_png(&chart.to_svg(), path)?)
        });
    }
    Ok(report)
}
