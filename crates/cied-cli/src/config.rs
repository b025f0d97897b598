//! Pipeline configuration loaded from TOML.
//!
//! Resolution order: `--config <PATH>`, then the `CIED_CONFIG` environment
//! variable, then `./cied.toml` when present, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cied_model::DeviceCategory;
use cied_report::{AnalysisSettings, OutputLayout};
use cied_stats::FitOptions;
use cied_store::DatasetPaths;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "CIED_CONFIG";
/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cied.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Source spreadsheet export.
    pub source: PathBuf,
    pub output_dir: PathBuf,
    /// Overrides `<output_dir>/clean.parquet`.
    pub parquet: Option<PathBuf>,
    /// Overrides `<output_dir>/clean.csv`.
    pub csv: Option<PathBuf>,
    /// Overrides `<output_dir>/figs`.
    pub figures_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("Database 6.12 clean LB.xlsx"),
            output_dir: PathBuf::from("outputs"),
            parquet: None,
            csv: None,
            figures_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub min_stratum_size: usize,
    pub dose_quantiles: Vec<f64>,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub stratum_devices: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let settings = AnalysisSettings::default();
        Self {
            min_stratum_size: settings.min_stratum_size,
            dose_quantiles: settings.dose_quantiles,
            max_iterations: settings.fit.max_iterations,
            tolerance: settings.fit.tolerance,
            stratum_devices: settings
                .stratum_devices
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
}

/// Picks the configuration file to read, if any.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    working_dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    let local = working_dir.join(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parse configuration {}", path.display()))
    }

    /// Loads the configuration following the documented resolution order.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env_value = std::env::var(CONFIG_ENV).ok();
        let working_dir = std::env::current_dir().context("determine working directory")?;
        match resolve_config_path(explicit, env_value.as_deref(), &working_dir) {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                Self::load(&path)
            }
            None => {
                debug!("no configuration file; using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if let Some(q) = analysis
            .dose_quantiles
            .iter()
            .find(|q| !(0.0..=1.0).contains(*q))
        {
            bail!("dose quantile {q} is outside [0, 1]");
        }
        if analysis.max_iterations == 0 {
            bail!("max_iterations must be positive");
        }
        if analysis.tolerance.is_nan() || analysis.tolerance <= 0.0 {
            bail!("tolerance must be positive");
        }
        self.stratum_devices()?;
        Ok(())
    }

    fn stratum_devices(&self) -> Result<Vec<DeviceCategory>> {
        self.analysis
            .stratum_devices
            .iter()
            .map(|name| {
                name.parse::<DeviceCategory>()
                    .with_context(|| format!("stratum device '{name}'"))
            })
            .collect()
    }

    pub fn dataset_paths(&self) -> DatasetPaths {
        let defaults = DatasetPaths::in_dir(&self.paths.output_dir);
        DatasetPaths {
            parquet: self.paths.parquet.clone().unwrap_or(defaults.parquet),
            csv: self.paths.csv.clone().unwrap_or(defaults.csv),
            manifest: defaults.manifest,
        }
    }

    pub fn output_layout(&self) -> OutputLayout {
        let mut layout = OutputLayout::in_dir(&self.paths.output_dir);
        if let Some(dir) = &self.paths.figures_dir {
            layout.figures_dir = dir.clone();
        }
        layout
    }

    pub fn analysis_settings(&self) -> Result<AnalysisSettings> {
        Ok(AnalysisSettings {
            min_stratum_size: self.analysis.min_stratum_size,
            dose_quantiles: self.analysis.dose_quantiles.clone(),
            stratum_devices: self.stratum_devices()?,
            fit: FitOptions {
                max_iterations: self.analysis.max_iterations,
                tolerance: self.analysis.tolerance,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string(&PipelineConfig::default()).unwrap();
        let parsed = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, PipelineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            "[paths]\noutput_dir = \"out\"\n\n[analysis]\nmin_stratum_size = 5\n",
        )
        .unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("out"));
        assert_eq!(config.analysis.min_stratum_size, 5);
        assert_eq!(config.analysis.max_iterations, 100);
        let paths = config.dataset_paths();
        assert_eq!(paths.parquet, PathBuf::from("out").join("clean.parquet"));
        assert_eq!(config.output_layout().figures_dir, PathBuf::from("out").join("figs"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(PipelineConfig::from_toml_str("[analysis]\ndose_quantiles = [1.5]\n").is_err());
        assert!(PipelineConfig::from_toml_str("[analysis]\nstratum_devices = [\"LEADLESS\"]\n").is_err());
        assert!(PipelineConfig::from_toml_str("[analysis]\ntolerance = 0.0\n").is_err());
        assert!(PipelineConfig::from_toml_str("[paths]\nunknown = 1\n").is_err());
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "").unwrap();
        let explicit = Path::new("custom.toml");
        assert_eq!(
            resolve_config_path(Some(explicit), Some("env.toml"), dir.path()),
            Some(PathBuf::from("custom.toml"))
        );
        assert_eq!(
            resolve_config_path(None, Some("env.toml"), dir.path()),
            Some(PathBuf::from("env.toml"))
        );
        assert_eq!(
            resolve_config_path(None, None, dir.path()),
            Some(dir.path().join(DEFAULT_CONFIG_FILE))
        );
        let empty = tempfile::tempdir().unwrap();
        assert_eq!(resolve_config_path(None, Some(" "), empty.path()), None);
    }
}
