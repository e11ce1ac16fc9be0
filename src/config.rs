use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{DailyWorkPattern, ScheduleItem, Task, Workflow};
use crate::time::LocalDate;

/// Named productivity window used by the cognitive-match factor (§4.6c).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CognitiveCapacity {
    Peak,
    High,
    Moderate,
    Low,
}

impl CognitiveCapacity {
    /// The complexity range `{peak:[4,5], high:[3,4], moderate:[2,3], low:[1,2]}`
    /// this capacity is considered a strong match for.
    pub fn matches_complexity(self, complexity: u8) -> bool {
        match self {
            CognitiveCapacity::Peak => (4..=5).contains(&complexity),
            CognitiveCapacity::High => (3..=4).contains(&complexity),
            CognitiveCapacity::Moderate => (2..=3).contains(&complexity),
            CognitiveCapacity::Low => (1..=2).contains(&complexity),
        }
    }

    /// The scalar level used for the graded mismatch formula in §4.6c.
    pub fn level(self) -> f64 {
        match self {
            CognitiveCapacity::Peak => 4.0,
            CognitiveCapacity::High => 3.0,
            CognitiveCapacity::Moderate => 2.0,
            CognitiveCapacity::Low => 1.0,
        }
    }
}

/// A window of the day (hour range, inclusive-exclusive) during which the
/// user's cognitive capacity is a given level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityPattern {
    pub start_hour: u32,
    pub end_hour: u32,
    pub cognitive_capacity: CognitiveCapacity,
}

impl ProductivityPattern {
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Non-capacity scheduling knobs that shape priority, not placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPreferences {
    pub context_switch_penalty: f64,
}

impl Default for SchedulingPreferences {
    fn default() -> Self {
        SchedulingPreferences { context_switch_penalty: 5.0 }
    }
}

/// Default daily work-hour envelope and capacity, with optional per-date
/// overrides. Used by deadline pressure (§4.6a) to compute
/// `workHoursPerDay = maxFocusHours + maxAdminHours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSettings {
    pub default_work_hours_start: crate::time::LocalTime,
    pub default_work_hours_end: crate::time::LocalTime,
    pub default_lunch_start: Option<crate::time::LocalTime>,
    pub default_lunch_duration_minutes: Option<i64>,
    pub max_focus_hours: f64,
    pub max_admin_hours: f64,
    #[serde(default)]
    pub custom_work_hours: HashMap<LocalDate, (crate::time::LocalTime, crate::time::LocalTime)>,
    #[serde(default)]
    pub custom_capacity: HashMap<LocalDate, (f64, f64)>,
    pub timezone: String,
}

impl WorkSettings {
    pub fn work_hours_per_day(&self) -> f64 {
        self.max_focus_hours + self.max_admin_hours
    }
}

/// Everything about the caller's world that the engine needs to schedule:
/// the candidate work, the calendar, and tuning knobs (§6 `context`).
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    pub start_date: LocalDate,
    pub tasks: Vec<Task>,
    pub workflows: Vec<Workflow>,
    pub work_patterns: Vec<DailyWorkPattern>,
    pub productivity_patterns: Vec<ProductivityPattern>,
    pub scheduling_preferences: SchedulingPreferences,
    pub work_settings: WorkSettings,
    pub current_time: DateTime<Utc>,
    pub last_scheduled_item: Option<LastScheduledItem>,
}

/// The minimal record of "what was scheduled right before this run" needed
/// for the context-switch penalty (§4.6 step 7).
#[derive(Debug, Clone)]
pub struct LastScheduledItem {
    pub task_id: Option<String>,
    pub project_id: Option<String>,
}

impl LastScheduledItem {
    pub fn differs_from(&self, item: &ScheduleItem) -> bool {
        let task_differs = self.task_id.as_deref() != Some(item.dependency_key());
        // No project concept exists on ScheduleItem today; a workflow id
        // stands in as the closest analogue of "project" for this penalty.
        let project_differs = self.project_id.as_deref() != item.workflow_id.as_deref();
        task_differs || project_differs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptimizationMode {
    Realistic,
    Optimal,
    Conservative,
}

/// Run-level knobs controlling the allocator's behavior (§6 `config`).
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub start_date: LocalDate,
    pub end_date: Option<LocalDate>,
    pub include_weekends: bool,
    pub allow_task_splitting: bool,
    pub respect_meetings: bool,
    pub optimization_mode: OptimizationMode,
    pub debug_mode: bool,
    pub max_days: u32,
    pub current_time: Option<DateTime<Utc>>,
}

impl SchedulingConfig {
    pub fn new(start_date: LocalDate) -> Self {
        SchedulingConfig {
            start_date,
            end_date: None,
            include_weekends: true,
            allow_task_splitting: true,
            respect_meetings: true,
            optimization_mode: OptimizationMode::Realistic,
            debug_mode: false,
            max_days: 30,
            current_time: None,
        }
    }
}
