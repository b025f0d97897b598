//! Analysis parameters and output locations shared by every stage.

use std::path::{Path, PathBuf};

use cied_model::DeviceCategory;
use cied_stats::FitOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Strata smaller than this are skipped by the heterogeneity stage.
    pub min_stratum_size: usize,
    /// Metric percentiles evaluated by the dose-response tables.
    pub dose_quantiles: Vec<f64>,
    pub stratum_devices: Vec<DeviceCategory>,
    pub fit: FitOptions,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_stratum_size: 20,
            dose_quantiles: vec![0.1, 0.25, 0.5, 0.75, 0.9],
            stratum_devices: vec![
                DeviceCategory::Ppm,
                DeviceCategory::Icd,
                DeviceCategory::Crt,
            ],
            fit: FitOptions::default(),
        }
    }
}

/// Where a stage writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub figures_dir: PathBuf,
}

impl OutputLayout {
    /// Tables in `dir`, figures in `dir/figs`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            figures_dir: dir.join("figs"),
        }
    }

    pub fn table(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn figure(&self, file_name: &str) -> PathBuf {
        self.figures_dir.join(file_name)
    }
}

/// Everything a stage needs besides the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct StageContext {
    pub settings: AnalysisSettings,
    pub layout: OutputLayout,
}

impl StageContext {
    pub fn new(settings: AnalysisSettings, layout: OutputLayout) -> Self {
        Self { settings, layout }
    }
}
