use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Phase of a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Processing,
    Merging,
    Done,
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub run_id: Option<Uuid>,
    pub total: usize,
    pub completed: usize,
    pub percent: f64,
    pub status: RunStatus,
    pub done: bool,
    /// Set when the run aborted; the run still reaches `done`.
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Progress {
    /// Snapshot reported when no run has been started.
    pub fn idle() -> Self {
        Self {
            run_id: None,
            total: 0,
            completed: 0,
            percent: 0.0,
            status: RunStatus::Idle,
            done: false,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn recompute(&mut self) {
        self.percent = if self.total > 0 {
            100.0 * self.completed as f64 / self.total as f64
        } else {
            0.0
        };
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::idle()
    }
}

/// Event broadcast to SSE subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A run was accepted.
    RunStarted {
        run_id: Uuid,
        input: PathBuf,
        output: PathBuf,
    },
    /// Any change to a run's progress.
    Progress {
        #[serde(flatten)]
        progress: Progress,
    },
    /// One episode was excluded from the merge.
    EpisodeFailed {
        run_id: Uuid,
        index: usize,
        file: PathBuf,
        error: String,
    },
    /// One output part was written.
    PartCompleted {
        run_id: Uuid,
        part: usize,
        path: PathBuf,
    },
    /// One output part could not be produced.
    PartFailed {
        run_id: Uuid,
        part: usize,
        error: String,
    },
}

impl AppEvent {
    /// Run this event belongs to.
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            AppEvent::RunStarted { run_id, .. }
            | AppEvent::EpisodeFailed { run_id, .. }
            | AppEvent::PartCompleted { run_id, .. }
            | AppEvent::PartFailed { run_id, .. } => Some(*run_id),
            AppEvent::Progress { progress } => progress.run_id,
        }
    }
}
