//! Per-stage run reports.
//!
//! Downstream stages fit many independent models; a failed fit is recorded
//! here and the stage carries on with its siblings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AttemptStatus {
    Succeeded,
    Failed { reason: String },
    Skipped { reason: String },
}

/// Outcome of one unit of work, e.g. one outcome x metric model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// Stable key such as `model_dx_change_artifact_burden_coefs`.
    pub key: String,
    #[serde(flatten)]
    pub status: AttemptStatus,
    /// Artifact written by the attempt, if any.
    pub artifact: Option<PathBuf>,
}

impl Attempt {
    pub fn succeeded(key: impl Into<String>, artifact: Option<PathBuf>) -> Self {
        Self {
            key: key.into(),
            status: AttemptStatus::Succeeded,
            artifact,
        }
    }

    pub fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: AttemptStatus::Failed {
                reason: reason.into(),
            },
            artifact: None,
        }
    }

    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: AttemptStatus::Skipped {
                reason: reason.into(),
            },
            artifact: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Succeeded
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub attempts: Vec<Attempt>,
}

impl StageReport {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            attempts: Vec::new(),
        }
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// Artifacts written by successful attempts, in attempt order.
    pub fn artifacts(&self) -> Vec<&PathBuf> {
        self.attempts
            .iter()
            .filter_map(|attempt| attempt.artifact.as_ref())
            .collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.status, AttemptStatus::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.status, AttemptStatus::Skipped { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
