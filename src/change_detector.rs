//! Change Detector (C9): deterministic content keys for tasks, workflows,
//! work settings, and sessions, used by callers to skip the entire pipeline
//! when nothing relevant changed (§4.9).

use std::collections::{HashMap, HashSet};

use crate::config::WorkSettings;
use crate::model::{DeadlineType, Task, Workflow};

fn opt_str<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}

/// A deterministic content key for one task: any field that should cause a
/// reschedule is part of this join.
pub fn task_key(task: &Task) -> String {
    [
        task.id.clone(),
        task.name.clone(),
        task.completed.to_string(),
        task.task_type_id.clone().unwrap_or_default(),
        task.duration.to_string(),
        opt_str(task.urgency),
        opt_str(task.importance),
        opt_str(task.cognitive_complexity),
        task.async_wait_time.to_string(),
        opt_str(task.deadline.map(|d| d.to_rfc3339())),
        matches!(task.deadline_type, Some(DeadlineType::Hard)).to_string(),
    ]
    .join(":")
}

fn step_key(step: &crate::model::WorkflowStep) -> String {
    [
        step.id.clone(),
        format!("{:?}", step.status),
        step.name.clone(),
        step.duration.to_string(),
        opt_str(step.cognitive_complexity),
        step.async_wait_time.to_string(),
    ]
    .join("/")
}

/// A deterministic content key for one workflow: its own fields joined with
/// every step's key, in source order (order matters: reordering steps is a
/// meaningful change).
pub fn workflow_key(workflow: &Workflow) -> String {
    let header = [
        workflow.id.clone(),
        workflow.name.clone(),
        opt_str(workflow.importance),
        opt_str(workflow.urgency),
        opt_str(workflow.deadline.map(|d| d.to_rfc3339())),
    ]
    .join(":");

    let steps = workflow.steps.iter().map(step_key).collect::<Vec<_>>().join(",");

    format!("{header}|{steps}")
}

/// `curr.length != prev.length` or the key sets differ.
pub fn have_tasks_changed(curr: &[Task], prev: &[Task]) -> bool {
    if curr.len() != prev.len() {
        return true;
    }
    let curr_keys: HashSet<String> = curr.iter().map(task_key).collect();
    let prev_keys: HashSet<String> = prev.iter().map(task_key).collect();
    curr_keys != prev_keys
}

pub fn have_workflows_changed(curr: &[Workflow], prev: &[Workflow]) -> bool {
    if curr.len() != prev.len() {
        return true;
    }
    let curr_keys: HashSet<String> = curr.iter().map(workflow_key).collect();
    let prev_keys: HashSet<String> = prev.iter().map(workflow_key).collect();
    curr_keys != prev_keys
}

/// Compares only the fields that affect scheduling capacity: default hours,
/// lunch, per-day capacity, the *set* of custom-date keys (not their
/// values — a value-only change inside an existing custom entry is not
/// detected, by contract; consumers must mutate by wholesale replacement),
/// and timezone.
pub fn have_work_settings_changed(curr: &WorkSettings, prev: &WorkSettings) -> bool {
    curr.default_work_hours_start != prev.default_work_hours_start
        || curr.default_work_hours_end != prev.default_work_hours_end
        || curr.default_lunch_start != prev.default_lunch_start
        || curr.default_lunch_duration_minutes != prev.default_lunch_duration_minutes
        || curr.max_focus_hours != prev.max_focus_hours
        || curr.max_admin_hours != prev.max_admin_hours
        || curr.timezone != prev.timezone
        || curr.custom_work_hours.keys().collect::<HashSet<_>>() != prev.custom_work_hours.keys().collect::<HashSet<_>>()
        || curr.custom_capacity.keys().collect::<HashSet<_>>() != prev.custom_capacity.keys().collect::<HashSet<_>>()
}

/// Sessions are represented by the caller as an opaque id -> content-key map;
/// this module only ever compares id sets, never the content keys
/// themselves (§4.9: "size ≠ size, or key sets differ").
pub type ActiveSessions = HashMap<String, String>;

pub fn have_active_sessions_changed(curr: &ActiveSessions, prev: &ActiveSessions) -> bool {
    if curr.len() != prev.len() {
        return true;
    }
    curr.keys().collect::<HashSet<_>>() != prev.keys().collect::<HashSet<_>>()
}

/// Drops completed tasks.
pub fn filter_schedulable_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| !t.completed).collect()
}

/// Keeps workflows with at least one actionable step, or a `Waiting` step
/// paired with a `Pending`/`InProgress` one.
pub fn filter_schedulable_workflows(workflows: &[Workflow]) -> Vec<&Workflow> {
    workflows.iter().filter(|w| w.has_schedulable_work()).collect()
}
