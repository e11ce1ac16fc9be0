//! Deterministic task-and-workflow scheduler: priority engine, dependency
//! graph, multi-day typed-capacity allocator, and change detector.
//!
//! The single entrypoint is [`schedule`]; everything else is exposed for
//! callers that want to drive the pipeline stage-by-stage (e.g. to run the
//! change detector before deciding whether to call `schedule` at all).

pub mod allocator;
pub mod capacity;
pub mod change_detector;
pub mod config;
pub mod convert;
pub mod debug_metrics;
pub mod error;
pub mod graph;
pub mod logger;
pub mod model;
pub mod priority;
pub mod time;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use config::SchedulingConfig;
use model::{SchedulableInput, ScheduleItem, Workflow};

pub use allocator::{Conflict, UnscheduledItem};
pub use debug_metrics::{ScheduleMetrics, SchedulingDebugInfo};

/// Non-fatal observations surfaced alongside a result (§7).
#[derive(Debug, Clone)]
pub enum Warning {
    SoftDeadlineRisk { item_id: String },
    CapacityWarning { block_id: String },
    CognitiveMismatch { item_id: String },
    ContextSwitch { item_id: String },
}

/// The outcome of a full [`schedule`] run. Infallible by design (§7): a
/// failed run still returns a `ScheduleResult`, with everything left in
/// `unscheduled` and the failure recorded in `conflicts`.
#[derive(Debug, Clone)]
pub struct ScheduleResult {
    pub scheduled: Vec<ScheduleItem>,
    pub unscheduled: Vec<UnscheduledItem>,
    pub debug_info: SchedulingDebugInfo,
    pub metrics: Option<ScheduleMetrics>,
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
}

/// For each item, the critical-path hours to feed the priority engine: a
/// workflow step inherits its parent workflow's critical path; a standalone
/// task uses its own duration.
fn critical_path_hours_by_item(items: &[ScheduleItem], workflows: &[Workflow]) -> HashMap<String, f64> {
    let mut by_workflow: HashMap<&str, f64> = HashMap::new();
    for workflow in workflows {
        by_workflow.insert(workflow.id.as_str(), workflow.critical_path_duration() as f64 / 60.0);
    }

    items
        .iter()
        .map(|item| {
            let hours = match &item.workflow_id {
                Some(workflow_id) => by_workflow.get(workflow_id.as_str()).copied().unwrap_or(0.0),
                None => item.duration as f64 / 60.0,
            };
            (item.id.clone(), hours)
        })
        .collect()
}

/// For each item, the chain deadline and dependent-work-hours the priority
/// engine's async-urgency compression ratio needs (§4.6b): walking forward
/// through every transitive dependent of an item, `chain_deadline` is the
/// nearest deadline found on the item itself or any of those dependents, and
/// `dependent_work_hours` is their total remaining duration.
fn chain_inputs_by_item(items: &[ScheduleItem]) -> HashMap<String, (Option<DateTime<Utc>>, f64)> {
    let graph = graph::build_graph(items);
    let mut dependents_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, deps) in &graph {
        for dep in deps {
            dependents_of.entry(dep.as_str()).or_default().push(id.as_str());
        }
    }

    let duration_of: HashMap<&str, i64> = items.iter().map(|i| (i.id.as_str(), i.duration)).collect();
    let deadline_of: HashMap<&str, Option<DateTime<Utc>>> = items.iter().map(|i| (i.id.as_str(), i.deadline)).collect();

    items
        .iter()
        .map(|item| {
            let mut visited: HashSet<&str> = HashSet::new();
            let mut stack: Vec<&str> = dependents_of.get(item.id.as_str()).cloned().unwrap_or_default();
            let mut total_minutes: i64 = 0;
            let mut nearest_deadline = item.deadline;

            while let Some(id) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                total_minutes += duration_of.get(id).copied().unwrap_or(0);
                if let Some(deadline) = deadline_of.get(id).copied().flatten() {
                    nearest_deadline = Some(nearest_deadline.map_or(deadline, |curr| curr.min(deadline)));
                }
                if let Some(next) = dependents_of.get(id) {
                    stack.extend(next);
                }
            }

            (item.id.clone(), (nearest_deadline, total_minutes as f64 / 60.0))
        })
        .collect()
}

fn warnings_for(scheduled: &[ScheduleItem]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let deadlines = debug_metrics::deadline_analysis(scheduled);
    for id in deadlines.at_risk_deadlines {
        warnings.push(Warning::SoftDeadlineRisk { item_id: id });
    }
    for item in scheduled {
        if let Some(workflow_id) = &item.workflow_id {
            if graph::dependency_chain_length(&graph::build_graph(scheduled), &item.id) > 5 {
                warnings.push(Warning::ContextSwitch { item_id: workflow_id.clone() });
            }
        }
    }
    warnings
}

/// `schedule(items, patterns, context, config) -> ScheduleResult` (§6): the
/// language-neutral entrypoint. Converts inputs, scores priority, allocates,
/// and assembles debug info and metrics — all from one value snapshot, with
/// no I/O and no suspension points (§5).
pub fn schedule(inputs: &[SchedulableInput], context: &config::SchedulingContext, config: &SchedulingConfig) -> ScheduleResult {
    let conversion = convert::convert_inputs(inputs);
    let critical_path_hours = critical_path_hours_by_item(&conversion.items, &context.workflows);
    let chain_inputs = chain_inputs_by_item(&conversion.items);

    let now = config.current_time.unwrap_or(context.current_time);

    let mut items = conversion.items;
    for item in items.iter_mut() {
        let (chain_deadline, dependent_work_hours) = chain_inputs.get(&item.id).cloned().unwrap_or((item.deadline, 0.0));
        let inputs = priority::PriorityInputs {
            critical_path_hours: critical_path_hours.get(&item.id).copied().unwrap_or(0.0),
            chain_deadline,
            dependent_work_hours,
        };
        let breakdown = priority::score_item(item, context, &inputs, now);
        item.priority = breakdown.total;
        item.priority_breakdown = Some(breakdown);
    }

    let result = allocator::allocate(items, &context.work_patterns, config, &conversion.completed_item_ids);

    let debug_info = debug_metrics::generate_debug_info(&result.scheduled, &result.unscheduled);
    let workflow_critical_path: i64 = context.workflows.iter().map(|w| w.critical_path_duration()).max().unwrap_or(0);
    let metrics = if config.debug_mode {
        Some(debug_metrics::calculate_metrics(&result.scheduled, &result.unscheduled, &context.work_patterns, workflow_critical_path))
    } else {
        None
    };
    let warnings = warnings_for(&result.scheduled);

    ScheduleResult {
        scheduled: result.scheduled,
        unscheduled: result.unscheduled,
        debug_info,
        metrics,
        conflicts: result.conflicts,
        warnings,
    }
}
