//! Debug & Metrics (C8): read-only views over a finished run, built purely
//! from its `scheduled`/`unscheduled` lists and the patterns that produced
//! them — never consulted by the allocator itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::allocator::{UnscheduledItem, MAX_BLOCK_MINUTES};
use crate::model::{BlockTypeConfig, DailyWorkPattern, ItemKind, PriorityBreakdown, ScheduleItem};
use crate::time::LocalDate;

#[derive(Debug, Clone)]
pub struct DebugRow {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub duration: i64,
    pub priority: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub breakdown: Option<PriorityBreakdown>,
}

#[derive(Debug, Clone)]
pub struct UnscheduledRow {
    pub id: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulingDebugInfo {
    pub scheduled_rows: Vec<DebugRow>,
    pub unscheduled_rows: Vec<UnscheduledRow>,
}

/// First ten scheduled items (priority order preserved from `scheduled`) and
/// every unscheduled item, each carrying the reason it was left out.
pub fn generate_debug_info(scheduled: &[ScheduleItem], unscheduled: &[UnscheduledItem]) -> SchedulingDebugInfo {
    let scheduled_rows = scheduled
        .iter()
        .take(10)
        .map(|item| DebugRow {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind,
            duration: item.duration,
            priority: item.priority,
            start_time: item.start_time,
            breakdown: item.priority_breakdown.clone(),
        })
        .collect();

    let unscheduled_rows = unscheduled
        .iter()
        .map(|u| UnscheduledRow { id: u.item.id.clone(), name: u.item.name.clone(), reason: classify_reason(u) })
        .collect();

    SchedulingDebugInfo { scheduled_rows, unscheduled_rows }
}

fn classify_reason(u: &UnscheduledItem) -> String {
    if u.item.duration > MAX_BLOCK_MINUTES {
        return "over-maximum-block-size".to_string();
    }
    u.reason.clone()
}

#[derive(Debug, Clone)]
pub struct BlockUtilization {
    pub date: LocalDate,
    pub block_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub capacity_minutes: i64,
    pub used_minutes: i64,
    pub type_config: BlockTypeConfig,
    pub utilization_percent: i32,
    pub is_current: bool,
    pub capacity_by_type: Option<HashMap<String, i64>>,
    pub used_by_type: Option<HashMap<String, i64>>,
    pub per_type_utilization: Option<HashMap<String, i32>>,
    pub reason_not_filled: Vec<String>,
}

/// Recomputes per-block usage from the finished schedule rather than
/// threading the allocator's transient `BlockCapacity` list back out of it —
/// debug views derive from the same public facts a caller has.
pub fn block_utilization(patterns: &[DailyWorkPattern], scheduled: &[ScheduleItem], current_time: Option<DateTime<Utc>>) -> Vec<BlockUtilization> {
    let mut rows = Vec::new();

    for pattern in patterns {
        for block in &pattern.blocks {
            let items_in_block: Vec<&ScheduleItem> = scheduled.iter().filter(|s| s.block_id.as_deref() == Some(block.id.as_str()) && !s.is_wait_time).collect();
            let capacity_minutes = block.total_minutes();
            let used_minutes: i64 = items_in_block.iter().map(|s| s.duration).sum();
            let utilization_percent = if capacity_minutes > 0 { ((used_minutes as f64 / capacity_minutes as f64) * 100.0).round() as i32 } else { 0 };

            let start = items_in_block.iter().filter_map(|s| s.start_time).min();
            let end = items_in_block.iter().filter_map(|s| s.end_time).max();

            let is_current = match (current_time, start, end) {
                (Some(now), Some(s), Some(e)) => now >= s && now < e,
                _ => false,
            };

            let (capacity_by_type, used_by_type, per_type_utilization) = match &block.type_config {
                BlockTypeConfig::Combo { allocations } => {
                    let mut cap_by_type = HashMap::new();
                    let mut used_by_type = HashMap::new();
                    let mut pct_by_type = HashMap::new();
                    for alloc in allocations {
                        let cap = (alloc.ratio * capacity_minutes as f64).round() as i64;
                        let used: i64 = items_in_block.iter().filter(|s| s.task_type_id.as_deref() == Some(alloc.type_id.as_str())).map(|s| s.duration).sum();
                        let pct = if cap > 0 { ((used as f64 / cap as f64) * 100.0).round() as i32 } else { 0 };
                        cap_by_type.insert(alloc.type_id.clone(), cap);
                        used_by_type.insert(alloc.type_id.clone(), used);
                        pct_by_type.insert(alloc.type_id.clone(), pct);
                    }
                    (Some(cap_by_type), Some(used_by_type), Some(pct_by_type))
                }
                _ => (None, None, None),
            };

            let mut reason_not_filled = Vec::new();
            if utilization_percent < 100 {
                reason_not_filled.push("capacity available".to_string());
            }
            if matches!(block.type_config, BlockTypeConfig::System { .. }) {
                reason_not_filled.push("system block accepts no task types".to_string());
            }

            rows.push(BlockUtilization {
                date: pattern.date.clone(),
                block_id: block.id.clone(),
                start: start.unwrap_or_else(|| current_time.unwrap_or_default()),
                end: end.unwrap_or_else(|| current_time.unwrap_or_default()),
                capacity_minutes,
                used_minutes,
                type_config: block.type_config.clone(),
                utilization_percent,
                is_current,
                capacity_by_type,
                used_by_type,
                per_type_utilization,
                reason_not_filled,
            });
        }
    }

    rows
}

#[derive(Debug, Clone, Default)]
pub struct DeadlineAnalysis {
    pub missed_deadlines: Vec<String>,
    pub at_risk_deadlines: Vec<String>,
    pub total_with_deadlines: usize,
}

/// `missedDeadlines`: placed past their deadline. `atRiskDeadlines`: placed
/// with less than 24h of buffer remaining.
pub fn deadline_analysis(scheduled: &[ScheduleItem]) -> DeadlineAnalysis {
    let mut missed = Vec::new();
    let mut at_risk = Vec::new();
    let mut total = 0usize;

    for item in scheduled {
        let Some(deadline) = item.deadline else { continue };
        total += 1;
        let Some(end) = item.end_time else { continue };
        if end > deadline {
            missed.push(item.id.clone());
        } else {
            let buffer_hours = (deadline - end).num_minutes() as f64 / 60.0;
            if buffer_hours > 0.0 && buffer_hours < 24.0 {
                at_risk.push(item.id.clone());
            }
        }
    }

    DeadlineAnalysis { missed_deadlines: missed, at_risk_deadlines: at_risk, total_with_deadlines: total }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleMetrics {
    pub total_work_days: usize,
    pub hours_by_type: HashMap<String, f64>,
    pub projected_completion_date: Option<DateTime<Utc>>,
    pub capacity_utilization: f64,
    pub deadline_risk_score: f64,
    pub critical_path_length_minutes: i64,
    pub scheduled_count: usize,
    pub unscheduled_count: usize,
    pub average_priority: f64,
}

/// `criticalPathMinutes` is supplied by the caller: it depends on the full
/// workflow dependency graph, which this module never sees (§4.4 owns it).
pub fn calculate_metrics(scheduled: &[ScheduleItem], unscheduled: &[UnscheduledItem], patterns: &[DailyWorkPattern], critical_path_minutes: i64) -> ScheduleMetrics {
    let total_work_days = patterns.iter().filter(|p| !p.blocks.is_empty()).count();

    let mut hours_by_type: HashMap<String, f64> = HashMap::new();
    for item in scheduled.iter().filter(|s| !s.is_wait_time && s.kind != ItemKind::Meeting) {
        let type_id = item.task_type_id.clone().unwrap_or_else(|| "unspecified".to_string());
        *hours_by_type.entry(type_id).or_insert(0.0) += item.duration as f64 / 60.0;
    }

    let projected_completion_date = scheduled.iter().filter_map(|s| s.end_time).max();

    let total_capacity_minutes: i64 = patterns.iter().flat_map(|p| p.blocks.iter()).map(|b| b.total_minutes()).sum();
    let used_minutes: i64 = scheduled.iter().filter(|s| !s.is_wait_time && s.kind != ItemKind::Meeting).map(|s| s.duration).sum();
    let capacity_utilization = if total_capacity_minutes > 0 { used_minutes as f64 / total_capacity_minutes as f64 } else { 0.0 };

    let deadlines = deadline_analysis(scheduled);
    let deadline_risk_score = if deadlines.total_with_deadlines > 0 {
        (deadlines.missed_deadlines.len() + deadlines.at_risk_deadlines.len()) as f64 / deadlines.total_with_deadlines as f64
    } else {
        0.0
    };

    let average_priority = if scheduled.is_empty() { 0.0 } else { scheduled.iter().map(|s| s.priority).sum::<f64>() / scheduled.len() as f64 };

    ScheduleMetrics {
        total_work_days,
        hours_by_type,
        projected_completion_date,
        capacity_utilization,
        deadline_risk_score,
        critical_path_length_minutes: critical_path_minutes,
        scheduled_count: scheduled.len(),
        unscheduled_count: unscheduled.len(),
        average_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockTypeConfig, ProvenanceRef, WorkBlock};
    use crate::time::LocalTime;
    use chrono::TimeZone;

    fn placed(id: &str, block_id: &str, type_id: &str, start: DateTime<Utc>, duration: i64) -> ScheduleItem {
        let mut item = ScheduleItem::bare(id, id, ItemKind::Task, duration, ProvenanceRef::Task { id: id.to_string() });
        item.block_id = Some(block_id.to_string());
        item.task_type_id = Some(type_id.to_string());
        item.start_time = Some(start);
        item.end_time = Some(start + chrono::Duration::minutes(duration));
        item
    }

    #[test]
    fn block_utilization_reports_half_full_block() {
        let pattern = DailyWorkPattern {
            date: LocalDate::parse("2025-01-10").unwrap(),
            blocks: vec![WorkBlock { id: "b1".to_string(), start_time: LocalTime::parse("09:00").unwrap(), end_time: LocalTime::parse("11:00").unwrap(), type_config: BlockTypeConfig::single("focused") }],
            meetings: Vec::new(),
        };
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let scheduled = vec![placed("t1", "b1", "focused", start, 60)];
        let rows = block_utilization(&[pattern], &scheduled, None);
        assert_eq!(rows[0].utilization_percent, 50);
    }

    #[test]
    fn deadline_analysis_flags_missed_and_at_risk() {
        let deadline = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let mut missed = placed("t1", "b1", "focused", Utc.with_ymd_and_hms(2025, 1, 10, 12, 30, 0).unwrap(), 30);
        missed.deadline = Some(deadline);
        let mut at_risk = placed("t2", "b1", "focused", Utc.with_ymd_and_hms(2025, 1, 9, 23, 0, 0).unwrap(), 30);
        at_risk.deadline = Some(deadline);

        let analysis = deadline_analysis(&[missed, at_risk]);
        assert_eq!(analysis.missed_deadlines, vec!["t1".to_string()]);
        assert_eq!(analysis.at_risk_deadlines, vec!["t2".to_string()]);
        assert_eq!(analysis.total_with_deadlines, 2);
    }

    #[test]
    fn calculate_metrics_sums_hours_by_type() {
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let scheduled = vec![placed("t1", "b1", "focused", start, 60), placed("t2", "b1", "admin", start, 30)];
        let metrics = calculate_metrics(&scheduled, &[], &[], 0);
        assert_eq!(metrics.hours_by_type.get("focused"), Some(&1.0));
        assert_eq!(metrics.hours_by_type.get("admin"), Some(&0.5));
        assert_eq!(metrics.scheduled_count, 2);
    }
}
