//! Catch-and-continue execution of independent attempts.

use std::fs;
use std::path::{Path, PathBuf};

use cied_model::{Attempt, StageReport};
use tracing::{info, warn};

use crate::error::{AttemptError, ReportError, Result};
use crate::table::ensure_parent;

/// Runs one attempt that produces `artifact` and records its outcome.
///
/// A failure is logged and recorded; it never stops the caller.
pub fn run_attempt<F>(report: &mut StageReport, key: &str, artifact: PathBuf, produce: F) -> bool
where
    F: FnOnce(&Path) -> std::result::Result<(), AttemptError>,
{
    match produce(&artifact) {
        Ok(()) => {
            info!(attempt = key, path = %artifact.display(), "wrote artifact");
            report.push(Attempt::succeeded(key, Some(artifact)));
            true
        }
        Err(err) => {
            warn!(attempt = key, reason = %err, "attempt failed");
            report.push(Attempt::failed(key, err.to_string()));
            false
        }
    }
}

/// Records an attempt that was not run.
pub fn skip_attempt(report: &mut StageReport, key: &str, reason: &str) {
    info!(attempt = key, reason, "attempt skipped");
    report.push(Attempt::skipped(key, reason));
}

/// Records `key` as failed with an upstream error that several attempts share.
pub fn fail_attempt(report: &mut StageReport, key: &str, err: &AttemptError) {
    warn!(attempt = key, reason = %err, "attempt failed");
    report.push(Attempt::failed(key, err.to_string()));
}

/// Path of the attempt log for a stage.
pub fn attempts_path(dir: &Path, stage: &str) -> PathBuf {
    dir.join(format!("{stage}_attempts.json"))
}

/// Persists the stage report as `{stage}_attempts.json`.
pub fn write_attempts(report: &StageReport, dir: &Path) -> Result<PathBuf> {
    let path = attempts_path(dir, &report.stage);
    ensure_parent(&path)?;
    let json = serde_json::to_string_pretty(report).map_err(|source| ReportError::AttemptLog {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| ReportError::Io {
        operation: "write",
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
