use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workflow::{StepAction, WorkflowStep};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSession {
    pub id: String,
    pub start_url: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    pub fn start(start_url: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_url,
            steps: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn add_step(&mut self, step: WorkflowStep) {
        self.steps.push(step);
    }

    /// Timestamp of the most recent step, for keeping timestamps monotonic
    pub fn last_timestamp(&self) -> i64 {
        self.steps.last().map(|s| s.timestamp).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub index: usize,
    pub action: StepAction,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn success(index: usize, action: StepAction) -> Self {
        Self {
            index,
            action,
            success: true,
            error: None,
        }
    }

    pub fn failure(index: usize, action: StepAction, error: String) -> Self {
        Self {
            index,
            action,
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStatus {
    Completed,
    /// Stopped at a navigate step that needs a document load by the host
    PendingNavigation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub status: ReplayStatus,
    pub total_steps: usize,
    /// Index of the next step to run after a pending navigation
    pub next_step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
    pub results: Vec<StepResult>,
}

impl ReplayReport {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
