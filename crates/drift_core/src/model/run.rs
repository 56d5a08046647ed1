//! Experiments and the lifecycle of their runs

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::ids::{ExperimentId, RunId};
use super::portfolio::Portfolio;
use super::results::ResultStats;
use crate::config::SimulationConfig;
use crate::error::StoreError;

/// A named simulation configuration that can be run any number of times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub portfolio: Portfolio,
    pub config: SimulationConfig,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything needed to create an experiment; identity and timestamps are
/// assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub portfolio: Portfolio,
    pub config: SimulationConfig,
}

impl Experiment {
    /// Materialize a draft with the given identity and creation time
    #[must_use]
    pub fn from_draft(id: ExperimentId, draft: ExperimentDraft, now: Timestamp) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            portfolio: draft.portfolio,
            config: draft.config,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lifecycle state of a run.
///
/// `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl RunStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "complete" => Ok(RunStatus::Complete),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            other => Err(StoreError::Serialization(format!(
                "unknown run status {other:?}"
            ))),
        }
    }
}

/// A single execution of an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub experiment_id: ExperimentId,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub status: RunStatus,
    /// Empty unless the run failed or was cancelled
    #[serde(default)]
    pub error: String,
    /// Zero-valued unless the run completed
    #[serde(default)]
    pub stats: ResultStats,
}

impl Run {
    /// A freshly started run in the `Running` state
    #[must_use]
    pub fn start(id: RunId, experiment_id: ExperimentId, started_at: Timestamp) -> Self {
        Self {
            id,
            experiment_id,
            started_at,
            finished_at: None,
            status: RunStatus::Running,
            error: String::new(),
            stats: ResultStats::default(),
        }
    }

    pub fn complete(&mut self, stats: ResultStats, at: Timestamp) {
        self.finish(RunStatus::Complete, at);
        self.stats = stats;
    }

    pub fn fail(&mut self, error: impl Into<String>, at: Timestamp) {
        self.finish(RunStatus::Failed, at);
        self.error = error.into();
    }

    pub fn cancel(&mut self, at: Timestamp) {
        self.finish(RunStatus::Cancelled, at);
        self.error = "simulation cancelled".to_string();
    }

    fn finish(&mut self, status: RunStatus, at: Timestamp) {
        debug_assert!(
            !self.status.is_terminal(),
            "run {} already finished as {}",
            self.id,
            self.status
        );
        self.status = status;
        self.finished_at = Some(at);
    }
}
