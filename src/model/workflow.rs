use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::DeadlineType;

/// Lifecycle state of a single step within a workflow.
///
/// The scheduler reads this state but never writes it (§4.7d): `Waiting`
/// steps emit only their wait block, never a work placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Pending,
    InProgress,
    Waiting,
    Completed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }

    pub fn is_actionable(self) -> bool {
        matches!(self, StepStatus::Pending | StepStatus::InProgress)
    }
}

/// A single node in a workflow's dependency DAG.
///
/// Importance/urgency/cognitive complexity fall back to the parent
/// [`Workflow`]'s values when `None` (§4.5); `task_type_id` and `deadline`
/// always come from the step and workflow respectively, never inherited
/// the other way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub duration: i64,
    pub status: StepStatus,
    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub cognitive_complexity: Option<u8>,
    pub task_type_id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub async_wait_time: i64,
    /// Set when `status == Waiting`: the instant the async wait started.
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration: i64) -> Self {
        WorkflowStep {
            id: id.into(),
            name: name.into(),
            duration,
            status: StepStatus::Pending,
            importance: None,
            urgency: None,
            cognitive_complexity: None,
            task_type_id: None,
            dependencies: Vec::new(),
            async_wait_time: 0,
            completed_at: None,
        }
    }

    pub fn is_waiting_on_async(&self) -> bool {
        self.status == StepStatus::Waiting
    }
}

/// A multi-step workflow: an ordered DAG of [`WorkflowStep`]s sharing a
/// deadline and default importance/urgency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub deadline_type: Option<DeadlineType>,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Workflow {
            id: id.into(),
            name: name.into(),
            importance: None,
            urgency: None,
            deadline: None,
            deadline_type: None,
            steps: Vec::new(),
        }
    }

    pub fn importance_or_default(&self) -> f64 {
        self.importance.unwrap_or(5.0)
    }

    pub fn urgency_or_default(&self) -> f64 {
        self.urgency.unwrap_or(5.0)
    }

    /// Longest dependency path through this workflow's steps, in minutes.
    pub fn critical_path_duration(&self) -> i64 {
        crate::graph::critical_path_minutes(
            self.steps.iter().map(|s| (s.id.as_str(), s.duration, s.dependencies.as_slice())),
        )
    }

    /// `true` if the workflow has at least one step worth scheduling: an
    /// actionable (non-terminal) step, or a `Waiting` step paired with a
    /// `Pending`/`InProgress` one (§4.9 `filterSchedulableWorkflows`).
    pub fn has_schedulable_work(&self) -> bool {
        let has_actionable = self.steps.iter().any(|s| s.status.is_actionable());
        let has_waiting = self.steps.iter().any(|s| s.status == StepStatus::Waiting);
        let has_pending_or_in_progress = self
            .steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Pending | StepStatus::InProgress));

        has_actionable || (has_waiting && has_pending_or_in_progress)
    }
}
