//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use cied_report::Stage;
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cied",
    version,
    about = "CIED-MRI registry pipeline",
    long_about = "Clean the CIED-MRI registry export and run the downstream analyses.\n\n\
                  `prep` writes the canonical dataset; every other stage reads it back.\n\
                  Paths and analysis settings come from --config, CIED_CONFIG or ./cied.toml."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured output directory.
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load the source export and write the canonical dataset.
    Prep(PrepArgs),
    /// Table 1 and Table 2 by device category.
    Describe,
    /// Main-effect logistic models with margins and dose-response.
    Models,
    /// Device-category mediation through artifact burden.
    Mediation,
    /// Per-device stratified models.
    Heterogeneity,
    /// Alternative metrics and the complete-case model.
    Sensitivity,
    /// Dose-response and ridge figures.
    Figures,
    /// Prep followed by every analysis stage.
    All(PrepArgs),
}

impl Command {
    /// The analysis stage this command runs, if it runs exactly one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Command::Describe => Some(Stage::Describe),
            Command::Models => Some(Stage::Models),
            Command::Mediation => Some(Stage::Mediation),
            Command::Heterogeneity => Some(Stage::Heterogeneity),
            Command::Sensitivity => Some(Stage::Sensitivity),
            Command::Figures => Some(Stage::Figures),
            Command::Prep(_) | Command::All(_) => None,
        }
    }
}

#[derive(Parser)]
pub struct PrepArgs {
    /// Source export (.xlsx or .csv); overrides the configured path.
    #[arg(long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
