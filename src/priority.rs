//! Priority Engine (C6): turns one [`ScheduleItem`] plus ambient scheduling
//! context into a [`PriorityBreakdown`] and a scalar `total` used to order
//! the allocator's greedy placement.

use chrono::{DateTime, Timelike, Utc};

use crate::config::{ProductivityPattern, SchedulingContext};
use crate::model::{DeadlineType, ItemKind, PriorityBreakdown, ScheduleItem};

/// Inputs the priority engine cannot derive from the item alone: they depend
/// on the item's place in the dependency graph / workflow, which the caller
/// (the top-level `schedule` entrypoint) has already computed once per run.
#[derive(Debug, Clone, Default)]
pub struct PriorityInputs {
    /// Remaining critical path for this item, in hours: a step's parent
    /// workflow's critical path, or a standalone task's own duration.
    pub critical_path_hours: f64,
    /// The nearest deadline reachable by walking this item's dependents, if
    /// any provides one (§4.6b "chain deadline").
    pub chain_deadline: Option<DateTime<Utc>>,
    /// Total remaining work, in hours, of the dependents gated behind this
    /// item's async wait.
    pub dependent_work_hours: f64,
}

fn importance_multiplier(value: f64) -> f64 {
    if value >= 9.0 {
        1.5
    } else if value >= 7.0 {
        1.2
    } else {
        1.0
    }
}

/// §4.6a: exponential pressure ramp as slack shrinks, capped at 1000 when
/// the deadline is already unreachable.
fn deadline_pressure(deadline_type: Option<DeadlineType>, slack_days: f64) -> f64 {
    if slack_days <= 0.0 {
        return 1000.0;
    }
    let hard = matches!(deadline_type, Some(DeadlineType::Hard));
    let k = if hard { 10.0 } else { 5.0 };
    let p = 1.1;
    let pressure = k / (slack_days + 0.4).powf(p);
    let base_pressure = if slack_days > 5.0 { 1.1 } else { 1.0 };
    pressure.max(base_pressure).clamp(base_pressure, 1000.0)
}

fn compute_deadline_pressure(item: &ScheduleItem, inputs: &PriorityInputs, work_hours_per_day: f64, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = item.deadline else {
        return 1.0;
    };
    let work_days_needed = if work_hours_per_day > 0.0 { inputs.critical_path_hours / work_hours_per_day } else { 0.0 };
    let days_until_deadline = (deadline - now).num_minutes() as f64 / (60.0 * 24.0);
    let slack_days = days_until_deadline - work_days_needed;
    deadline_pressure(item.deadline_type, slack_days)
}

/// §4.6b: boosts priority for items gating an async wait, scaled further by
/// how compressed the remaining chain work is against the time left after
/// the wait elapses.
fn async_urgency(item: &ScheduleItem, inputs: &PriorityInputs, work_hours_per_day: f64, now: DateTime<Utc>) -> f64 {
    let async_wait_time = item.async_wait_time.unwrap_or(0);
    if async_wait_time <= 0 || item.duration <= 0 {
        return 0.0;
    }

    let async_wait_hours = async_wait_time as f64 / 60.0;
    let base = (40.0 + async_wait_hours * 40.0).min(500.0);

    let Some(chain_deadline) = inputs.chain_deadline else {
        return base;
    };

    let hours_until_deadline = ((chain_deadline - now).num_minutes() as f64 / 60.0).max(0.0);
    let days_until_deadline = hours_until_deadline / 24.0;
    let available_time_after_async = hours_until_deadline - async_wait_hours;
    let available_work_hours = (available_time_after_async / 24.0) * work_hours_per_day;

    let compression_ratio = if available_work_hours > 0.0 { inputs.dependent_work_hours / available_work_hours } else { 2.0 };

    let async_ratio = async_wait_hours / hours_until_deadline.max(1.0);
    let base_async_urgency = 20.0 * (3.0 * async_ratio).exp();
    let wait_time_boost = 10.0 * (async_wait_hours / 24.0).exp();
    let compression_boost = 5.0 * compression_ratio.exp();
    let time_pressure = 10.0 / (days_until_deadline + 1.0);

    let sum = base_async_urgency + wait_time_boost + compression_boost + time_pressure;

    if compression_ratio > 1.5 {
        sum.max(200.0)
    } else if compression_ratio >= 0.7 {
        sum.max(80.0)
    } else {
        sum.min(300.0)
    }
}

/// §4.6c: `1.2` on a strong capacity/complexity match, else a graded
/// mismatch penalty floored at `0.7`; `1.0` with nothing configured.
fn cognitive_match_factor(patterns: &[ProductivityPattern], now: DateTime<Utc>, complexity: u8) -> f64 {
    if patterns.is_empty() {
        return 1.0;
    }
    let hour = now.hour();
    let Some(pattern) = patterns.iter().find(|p| p.contains_hour(hour)) else {
        return 1.0;
    };
    if pattern.cognitive_capacity.matches_complexity(complexity) {
        1.2
    } else {
        let level = pattern.cognitive_capacity.level();
        (1.0 - 0.15 * (level - complexity as f64).abs()).max(0.7)
    }
}

/// Computes the full [`PriorityBreakdown`] for one item (§4.6 steps 1-9).
pub fn score_item(item: &ScheduleItem, context: &SchedulingContext, inputs: &PriorityInputs, now: DateTime<Utc>) -> PriorityBreakdown {
    let importance = item.importance.unwrap_or(5.0);
    let urgency = item.urgency.unwrap_or(5.0);

    let eisenhower = importance * urgency;
    let mi = importance_multiplier(importance);
    let mu = importance_multiplier(urgency);
    let weighted = eisenhower * mi * mu;

    let work_hours_per_day = context.work_settings.work_hours_per_day();

    let pressure = compute_deadline_pressure(item, inputs, work_hours_per_day, now);
    let deadline_boost = if pressure > 1.0 { pressure * 100.0 } else { 0.0 };

    let async_boost = async_urgency(item, inputs, work_hours_per_day, now);

    let complexity = item.cognitive_complexity.unwrap_or(3);
    let cognitive_match_f = cognitive_match_factor(&context.productivity_patterns, now, complexity);
    let cognitive_match = weighted * (cognitive_match_f - 1.0);

    let context_switch_penalty = match &context.last_scheduled_item {
        Some(last) if last.differs_from(item) => -context.scheduling_preferences.context_switch_penalty,
        _ => 0.0,
    };

    let workflow_depth_bonus = if item.kind == ItemKind::WorkflowStep {
        (inputs.critical_path_hours * 5.0).min(50.0)
    } else {
        0.0
    };

    let total = weighted + deadline_boost + async_boost * cognitive_match_f + context_switch_penalty + workflow_depth_bonus;

    PriorityBreakdown {
        eisenhower,
        weighted,
        deadline_pressure: pressure,
        deadline_boost,
        async_boost,
        cognitive_match_factor: cognitive_match_f,
        cognitive_match,
        context_switch_penalty,
        workflow_depth_bonus,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LastScheduledItem, OptimizationMode, SchedulingPreferences, WorkSettings};
    use crate::model::{ItemKind, ProvenanceRef};
    use crate::time::LocalDate;
    use chrono::TimeZone;

    fn base_context(now: DateTime<Utc>) -> SchedulingContext {
        SchedulingContext {
            start_date: LocalDate::parse("2025-01-10").unwrap(),
            tasks: Vec::new(),
            workflows: Vec::new(),
            work_patterns: Vec::new(),
            productivity_patterns: Vec::new(),
            scheduling_preferences: SchedulingPreferences::default(),
            work_settings: WorkSettings {
                default_work_hours_start: crate::time::LocalTime::parse("09:00").unwrap(),
                default_work_hours_end: crate::time::LocalTime::parse("17:00").unwrap(),
                default_lunch_start: None,
                default_lunch_duration_minutes: None,
                max_focus_hours: 6.0,
                max_admin_hours: 2.0,
                custom_work_hours: Default::default(),
                custom_capacity: Default::default(),
                timezone: "UTC".to_string(),
            },
            current_time: now,
            last_scheduled_item: None,
        }
    }

    fn base_item() -> ScheduleItem {
        ScheduleItem::bare("t1", "Task", ItemKind::Task, 60, ProvenanceRef::Task { id: "t1".to_string() })
    }

    #[test]
    fn default_importance_and_urgency_give_eisenhower_of_25() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let item = base_item();
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.eisenhower, 25.0);
        assert_eq!(breakdown.weighted, 25.0);
    }

    #[test]
    fn high_importance_and_urgency_apply_the_1_5x_multiplier_each() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let mut item = base_item();
        item.importance = Some(9.0);
        item.urgency = Some(9.0);
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.eisenhower, 81.0);
        assert_eq!(breakdown.weighted, 81.0 * 1.5 * 1.5);
    }

    #[test]
    fn missed_deadline_slack_caps_pressure_at_1000() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let mut item = base_item();
        item.deadline = Some(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
        item.deadline_type = Some(DeadlineType::Hard);
        let inputs = PriorityInputs { critical_path_hours: 10.0, ..Default::default() };
        let breakdown = score_item(&item, &context, &inputs, now);
        assert_eq!(breakdown.deadline_pressure, 1000.0);
        assert_eq!(breakdown.deadline_boost, 100_000.0);
    }

    #[test]
    fn no_deadline_means_neutral_pressure_and_no_boost() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let item = base_item();
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.deadline_pressure, 1.0);
        assert_eq!(breakdown.deadline_boost, 0.0);
    }

    #[test]
    fn zero_async_wait_time_produces_no_async_boost() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let item = base_item();
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.async_boost, 0.0);
    }

    #[test]
    fn async_wait_with_no_chain_deadline_gives_the_base_boost() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let mut item = base_item();
        item.async_wait_time = Some(120);
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.async_boost, 40.0 + 2.0 * 40.0);
    }

    #[test]
    fn context_switch_penalty_applies_when_last_item_differs() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let mut context = base_context(now);
        context.last_scheduled_item = Some(LastScheduledItem { task_id: Some("other".to_string()), project_id: None });
        let item = base_item();
        let breakdown = score_item(&item, &context, &PriorityInputs::default(), now);
        assert_eq!(breakdown.context_switch_penalty, -5.0);
    }

    #[test]
    fn workflow_step_gets_a_depth_bonus_capped_at_50() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let context = base_context(now);
        let mut item = base_item();
        item.kind = ItemKind::WorkflowStep;
        let inputs = PriorityInputs { critical_path_hours: 100.0, ..Default::default() };
        let breakdown = score_item(&item, &context, &inputs, now);
        assert_eq!(breakdown.workflow_depth_bonus, 50.0);
    }

    #[test]
    fn optimization_mode_variants_are_constructible() {
        let _ = OptimizationMode::Realistic;
        let _ = OptimizationMode::Optimal;
        let _ = OptimizationMode::Conservative;
    }
}
