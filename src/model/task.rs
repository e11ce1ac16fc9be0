use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a deadline is a hard cutoff or a soft target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeadlineType {
    Hard,
    Soft,
}

/// An atomic, schedulable unit of work.
///
/// `task_type_id` is an opaque identifier matched against
/// [`crate::model::block::BlockTypeConfig`] by [`crate::capacity`]; the
/// reserved ids `focused`, `admin`, `personal`, and the wildcard `mixed` are
/// recognized by convention, not by a closed enum, per the spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub duration: i64,
    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub cognitive_complexity: Option<u8>,
    pub task_type_id: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub deadline_type: Option<DeadlineType>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub async_wait_time: i64,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Distinguishes a task already "in flight" asynchronously (its body was
    /// already executed elsewhere; only the wait remains) from one that has
    /// not started.
    #[serde(default)]
    pub is_waiting_on_async: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration: i64) -> Self {
        Task {
            id: id.into(),
            name: name.into(),
            duration,
            importance: None,
            urgency: None,
            cognitive_complexity: None,
            task_type_id: None,
            deadline: None,
            deadline_type: None,
            dependencies: Vec::new(),
            async_wait_time: 0,
            completed: false,
            completed_at: None,
            is_waiting_on_async: false,
        }
    }

    pub fn importance_or_default(&self) -> f64 {
        self.importance.unwrap_or(5.0)
    }

    pub fn urgency_or_default(&self) -> f64 {
        self.urgency.unwrap_or(5.0)
    }

    pub fn cognitive_complexity_or_default(&self) -> u8 {
        self.cognitive_complexity.unwrap_or(3)
    }
}
