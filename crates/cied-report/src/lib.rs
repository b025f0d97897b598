//! Downstream analysis stages over the canonical dataset.
//!
//! Every stage reads the dataset, runs a batch of independent attempts and
//! returns a [`StageReport`]. A failed attempt is recorded and its siblings
//! still run; only structural problems (unwritable output directory, missing
//! grouping column for a whole table) surface as [`ReportError`].

pub mod artifacts;
pub mod attempt;
pub mod descriptives;
pub mod effects;
pub mod error;
pub mod figures;
pub mod heterogeneity;
pub mod mediation;
pub mod sensitivity;
pub mod settings;
pub mod table;
pub mod vars;

use std::fmt;
use std::fs;

use cied_model::StageReport;
use polars::prelude::DataFrame;
use tracing::{info, info_span};

pub use attempt::{attempts_path, write_attempts};
pub use error::{AttemptError, ReportError, Result};
pub use settings::{AnalysisSettings, OutputLayout, StageContext};
pub use table::CsvTable;

/// One downstream analysis stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Describe,
    Models,
    Mediation,
    Heterogeneity,
    Sensitivity,
    Figures,
}

impl Stage {
    /// Stages in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Describe,
        Stage::Models,
        Stage::Mediation,
        Stage::Heterogeneity,
        Stage::Sensitivity,
        Stage::Figures,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Describe => "describe",
            Stage::Models => "models",
            Stage::Mediation => "mediation",
            Stage::Heterogeneity => "heterogeneity",
            Stage::Sensitivity => "sensitivity",
            Stage::Figures => "figures",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `stage` and persists its attempt log next to its artifacts.
pub fn run_stage(stage: Stage, df: &DataFrame, ctx: &StageContext) -> Result<StageReport> {
    let span = info_span!("stage", stage = stage.name());
    let _guard = span.enter();

    fs::create_dir_all(&ctx.layout.dir).map_err(|source| ReportError::Io {
        operation: "create directory",
        path: ctx.layout.dir.clone(),
        source,
    })?;

    let report = match stage {
        Stage::Describe => descriptives::run_descriptives(df, ctx)?,
        Stage::Models => effects::run_main_effects(df, ctx)?,
        Stage::Mediation => mediation::run_mediation(df, ctx)?,
        Stage::Heterogeneity => heterogeneity::run_heterogeneity(df, ctx)?,
        Stage::Sensitivity => sensitivity::run_sensitivity(df, ctx)?,
        Stage::Figures => figures::run_figures(df, ctx)?,
    };
    write_attempts(&report, &ctx.layout.dir)?;
    info!(
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        skipped = report.skipped_count(),
        "stage finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_unique() {
        let mut names: Vec<&str> = Stage::ALL.iter().map(Stage::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Stage::ALL.len());
        assert_eq!(Stage::Models.to_string(), "models");
    }
}
