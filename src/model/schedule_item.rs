use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::DeadlineType;
use crate::time::LocalTime;

/// What a [`ScheduleItem`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Task,
    WorkflowStep,
    AsyncWait,
    Meeting,
    Break,
    BlockedTime,
}

/// A minimal back-pointer to the input that produced a [`ScheduleItem`],
/// carrying only the fields downstream components (Priority Engine,
/// Allocator) actually need (§9 "Design Notes": no shared references to
/// input objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProvenanceRef {
    Task { id: String },
    WorkflowStep { workflow_id: String, workflow_name: String, step_index: usize },
}

/// The fully annotated priority computation for one item (§4.6), kept around
/// for `generateDebugInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub eisenhower: f64,
    pub weighted: f64,
    pub deadline_pressure: f64,
    pub deadline_boost: f64,
    pub async_boost: f64,
    pub cognitive_match_factor: f64,
    pub cognitive_match: f64,
    pub context_switch_penalty: f64,
    pub workflow_depth_bonus: f64,
    pub total: f64,
}

/// The uniform, internal representation every schedulable input is converted
/// into (§3 "ScheduleItem (internal uniform)").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub duration: i64,
    pub priority: f64,
    pub priority_breakdown: Option<PriorityBreakdown>,

    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub cognitive_complexity: Option<u8>,
    pub task_type_id: Option<String>,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    pub deadline: Option<DateTime<Utc>>,
    pub deadline_type: Option<DeadlineType>,

    pub dependencies: Vec<String>,
    pub async_wait_time: Option<i64>,

    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub locked: bool,

    pub is_split: bool,
    pub split_part: Option<u32>,
    pub split_total: Option<u32>,
    pub original_task_id: Option<String>,
    pub remaining_duration: Option<i64>,

    pub workflow_id: Option<String>,
    pub workflow_name: Option<String>,
    pub step_index: Option<usize>,

    pub block_id: Option<String>,

    pub is_wait_time: bool,
    pub is_future_wait: bool,
    pub is_waiting_on_async: bool,

    pub original_ref: ProvenanceRef,
}

impl ScheduleItem {
    /// A bare, unscored item of the given kind. Callers fill in the rest
    /// through field assignment; this mirrors the permissive construction
    /// style of the converter, which builds items field-by-field per input
    /// kind rather than through a single constructor with dozens of params.
    pub fn bare(id: impl Into<String>, name: impl Into<String>, kind: ItemKind, duration: i64, original_ref: ProvenanceRef) -> Self {
        ScheduleItem {
            id: id.into(),
            name: name.into(),
            kind,
            duration,
            priority: 0.0,
            priority_breakdown: None,
            importance: None,
            urgency: None,
            cognitive_complexity: None,
            task_type_id: None,
            start_time: None,
            end_time: None,
            deadline: None,
            deadline_type: None,
            dependencies: Vec::new(),
            async_wait_time: None,
            completed: false,
            completed_at: None,
            locked: false,
            is_split: false,
            split_part: None,
            split_total: None,
            original_task_id: None,
            remaining_duration: None,
            workflow_id: None,
            workflow_name: None,
            step_index: None,
            block_id: None,
            is_wait_time: false,
            is_future_wait: false,
            is_waiting_on_async: false,
            original_ref,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// The id a downstream dependency lookup should match: a split part
    /// reports back its `original_task_id` so siblings depending on the
    /// un-split task still resolve (§4.7c).
    pub fn dependency_key(&self) -> &str {
        self.original_task_id.as_deref().unwrap_or(&self.id)
    }

    pub fn local_start_time(&self) -> Option<LocalTime> {
        self.start_time.map(|t| LocalTime::from_instant(&t))
    }
}
