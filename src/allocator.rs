//! Allocator (C7): the greedy, day-by-day placer. Given priority-scored,
//! dependency-aware items and a calendar of typed work blocks, produces a
//! placement that respects capacity, dependency ordering, and async waits.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::capacity;
use crate::config::SchedulingConfig;
use crate::error::Error;
use crate::graph;
use crate::model::{BlockCapacity, BlockTypeConfig, DailyWorkPattern, ItemKind, ScheduleItem, WorkMeeting};
use crate::time::{LocalDate, LocalTime};

/// Minimum viable chunk of a split task, and the trigger threshold for
/// offering a partial fit in the first place (§4.7a's historical-divergence
/// fix: one constant serves both roles).
pub const MIN_SPLIT_MINUTES: i64 = 30;

/// Above this many minutes a single item is considered unschedulable in one
/// sitting regardless of splitting (§4.8 "over-maximum-block-size").
pub const MAX_BLOCK_MINUTES: i64 = 480;

#[derive(Debug, Clone)]
pub enum Conflict {
    DependencyCycle { ids: Vec<String> },
    MissingDependency { dependent: String, dependency: String },
}

#[derive(Debug, Clone)]
pub struct UnscheduledItem {
    pub item: ScheduleItem,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AllocationResult {
    pub scheduled: Vec<ScheduleItem>,
    pub unscheduled: Vec<UnscheduledItem>,
    pub conflicts: Vec<Conflict>,
}

fn instant_at(date: &LocalDate, time: &LocalTime) -> DateTime<Utc> {
    let naive_time = chrono::NaiveTime::from_hms_opt((time.to_minutes() / 60) as u32, (time.to_minutes() % 60) as u32, 0).expect("LocalTime is always in range");
    let naive_dt = date.to_naive().and_time(naive_time);
    chrono::Local
        .from_local_datetime(&naive_dt)
        .single()
        .or_else(|| chrono::Local.from_local_datetime(&naive_dt).earliest())
        .expect("local datetime resolves to at least one instant")
        .with_timezone(&Utc)
}

fn meeting_instants(date: &LocalDate, meeting: &WorkMeeting) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = instant_at(date, &meeting.start_time);
    let end_date = if meeting.crosses_midnight() { date.next_day() } else { date.clone() };
    let end = instant_at(&end_date, &meeting.end_time);
    (start, end)
}

fn is_weekend(date: &LocalDate) -> bool {
    matches!(date.to_naive().weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn base_name_of(item: &ScheduleItem) -> String {
    match item.name.find(" (Part ") {
        Some(pos) => item.name[..pos].to_string(),
        None => item.name.clone(),
    }
}

/// Validates that every dependency referenced by `items` resolves to either
/// a completed id or another item in the set, and that the dependency graph
/// is acyclic. Both failures abort the entire run per §4.7d.
fn validate(items: &[ScheduleItem], completed_ids: &HashSet<String>) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    let graph = graph::build_graph(items);
    let report = graph::detect_cycles(&graph);
    if report.has_cycle {
        let mut ids: Vec<String> = report.cycles.into_iter().flatten().collect();
        ids.sort();
        ids.dedup();
        conflicts.push(Conflict::DependencyCycle { ids });
    }

    let known_ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    for item in items {
        for dep in &item.dependencies {
            if !completed_ids.contains(dep) && !known_ids.contains(dep.as_str()) {
                conflicts.push(Conflict::MissingDependency { dependent: item.id.clone(), dependency: dep.clone() });
            }
        }
    }

    conflicts
}

/// `Some(lower_bound)` if every dependency of `item` is satisfied, where
/// `lower_bound` is the latest end time among dependencies that were placed
/// in this run (completed-before-this-run dependencies impose no bound).
/// `None` if some dependency is not yet resolved.
fn dependency_ready_at(item: &ScheduleItem, completed_ids: &HashSet<String>, scheduled: &[ScheduleItem]) -> Option<DateTime<Utc>> {
    let mut lower_bound: Option<DateTime<Utc>> = None;
    for dep in &item.dependencies {
        if completed_ids.contains(dep) {
            continue;
        }
        let dep_end = scheduled
            .iter()
            .filter(|s| &s.id == dep || s.original_task_id.as_deref() == Some(dep.as_str()))
            .filter_map(|s| s.end_time)
            .max();
        match dep_end {
            None => return None,
            Some(t) => lower_bound = Some(lower_bound.map_or(t, |l| l.max(t))),
        }
    }
    Some(lower_bound.unwrap_or(DateTime::<Utc>::MIN_UTC))
}

enum Placement {
    Full { block_index: usize, start: DateTime<Utc> },
    Partial { block_index: usize, start: DateTime<Utc>, available_minutes: i64 },
}

/// §4.7a: the first block (in start-time order) that fully fits `item` wins;
/// otherwise the first block offering a partial fit above [`MIN_SPLIT_MINUTES`].
fn find_best_block(item: &ScheduleItem, capacities: &[BlockCapacity], scheduled: &[ScheduleItem], min_start: DateTime<Utc>) -> Option<Placement> {
    let type_id = item.task_type_id.as_deref().unwrap_or(capacity::MIXED_TYPE_ID);
    let mut first_partial: Option<Placement> = None;

    for (index, cap) in capacities.iter().enumerate() {
        if !capacity::block_accepts_type(&cap.type_config, type_id) {
            continue;
        }

        let earliest = cap.start_time.max(min_start);
        let mut placed_in_block: Vec<&ScheduleItem> = scheduled.iter().filter(|s| s.block_id.as_deref() == Some(cap.block_id.as_str()) && !s.is_wait_time).collect();
        placed_in_block.sort_by_key(|s| s.start_time);

        let mut cursor = earliest;
        for placed in &placed_in_block {
            let (Some(s), Some(e)) = (placed.start_time, placed.end_time) else { continue };
            if s > cursor && (s - cursor).num_minutes() >= item.duration {
                break;
            }
            if e > cursor {
                cursor = e;
            }
        }

        if cursor >= cap.end_time {
            continue;
        }

        let remaining_in_block = (cap.end_time - cursor).num_minutes();
        let type_cap = capacity::capacity_for_task_type(&cap.type_config, cap.total_minutes, type_id);
        let used_for_type = match &cap.type_config {
            BlockTypeConfig::Combo { .. } => *cap.used_minutes_by_type.get(type_id).unwrap_or(&0),
            _ => cap.used_minutes,
        };
        let available = (type_cap - used_for_type).min(remaining_in_block);

        if available >= item.duration {
            return Some(Placement::Full { block_index: index, start: cursor });
        } else if available > MIN_SPLIT_MINUTES && first_partial.is_none() {
            first_partial = Some(Placement::Partial { block_index: index, start: cursor, available_minutes: available });
        }
    }

    first_partial
}

struct SplitState {
    original_id: String,
    base_name: String,
    part_number: u32,
}

fn place_split_part(item: &ScheduleItem, state: &SplitState, start: DateTime<Utc>, part_duration: i64) -> (ScheduleItem, Option<ScheduleItem>) {
    let end = start + Duration::minutes(part_duration);
    let mut placed = item.clone();
    placed.id = format!("{}-part-{}", state.original_id, state.part_number);
    placed.name = format!("{} (Part {})", state.base_name, state.part_number);
    placed.duration = part_duration;
    placed.is_split = true;
    placed.split_part = Some(state.part_number);
    placed.original_task_id = Some(state.original_id.clone());
    placed.start_time = Some(start);
    placed.end_time = Some(end);

    let remainder = item.duration - part_duration;
    placed.remaining_duration = if remainder > 0 { Some(remainder) } else { None };

    if remainder <= 0 {
        return (placed, None);
    }

    let mut tail = item.clone();
    tail.id = format!("{}-part-{}", state.original_id, state.part_number + 1);
    tail.name = format!("{} (Part {})", state.base_name, state.part_number + 1);
    tail.duration = remainder;
    tail.is_split = true;
    tail.split_part = Some(state.part_number + 1);
    tail.original_task_id = Some(state.original_id.clone());
    tail.remaining_duration = Some(remainder);

    (placed, Some(tail))
}

fn finalize_split(scheduled: &mut [ScheduleItem], original_id: &str, base_name: &str, final_count: u32) {
    for item in scheduled.iter_mut() {
        if item.original_task_id.as_deref() == Some(original_id) {
            item.split_total = Some(final_count);
            if let Some(part) = item.split_part {
                item.name = format!("{} (Part {}/{})", base_name, part, final_count);
            }
        }
    }
}

/// `true` if every block across `patterns` that accepts `item`'s task type
/// is consumed by meetings down to less than [`MIN_SPLIT_MINUTES`] of free
/// time, and at least one such block exists (§4.8 "meeting-with-no-time").
fn meetings_consume_all_eligible_blocks(item: &ScheduleItem, patterns: &[DailyWorkPattern], scheduled: &[ScheduleItem]) -> bool {
    let type_id = item.task_type_id.as_deref().unwrap_or(capacity::MIXED_TYPE_ID);
    let mut found_eligible_block = false;

    for pattern in patterns {
        for block in &pattern.blocks {
            if !capacity::block_accepts_type(&block.type_config, type_id) {
                continue;
            }
            found_eligible_block = true;

            let block_start = instant_at(&pattern.date, &block.start_time);
            let block_end = instant_at(&pattern.date, &block.end_time);
            let block_minutes = (block_end - block_start).num_minutes();

            let meeting_minutes: i64 = scheduled
                .iter()
                .filter(|s| s.kind == ItemKind::Meeting && s.block_id.as_deref() == Some(block.id.as_str()))
                .filter_map(|s| match (s.start_time, s.end_time) {
                    (Some(s0), Some(e0)) => Some((e0.min(block_end) - s0.max(block_start)).num_minutes().max(0)),
                    _ => None,
                })
                .sum();

            if block_minutes - meeting_minutes >= MIN_SPLIT_MINUTES {
                return false;
            }
        }
    }

    found_eligible_block
}

fn unscheduled_reason(item: &ScheduleItem, completed_ids: &HashSet<String>, scheduled: &[ScheduleItem], patterns: &[DailyWorkPattern]) -> String {
    if item.duration > MAX_BLOCK_MINUTES {
        return "over-maximum-block-size".to_string();
    }
    let unresolved: Vec<&str> = item
        .dependencies
        .iter()
        .filter(|dep| !completed_ids.contains(*dep) && !scheduled.iter().any(|s| (&s.id == *dep || s.original_task_id.as_deref() == Some(dep.as_str())) && s.end_time.is_some()))
        .map(|d| d.as_str())
        .collect();
    if !unresolved.is_empty() {
        return format!("blocked-by-dependencies: {}", unresolved.join(", "));
    }
    if meetings_consume_all_eligible_blocks(item, patterns, scheduled) {
        return "meeting-with-no-time".to_string();
    }
    "no-slot-found".to_string()
}

/// Public entrypoint: `allocate(items, patterns, config, completedIds) ->
/// placed[]` (§4.7). Items must already be priority-scored (`item.priority`
/// populated); dependency ordering is enforced here, not by pre-sorting.
pub fn allocate(items: Vec<ScheduleItem>, patterns: &[DailyWorkPattern], config: &SchedulingConfig, completed_ids: &[String]) -> AllocationResult {
    let completed_ids: HashSet<String> = completed_ids.iter().cloned().collect();
    let active_items: Vec<ScheduleItem> = items.into_iter().filter(|i| !i.completed).collect();

    let conflicts = validate(&active_items, &completed_ids);
    if !conflicts.is_empty() {
        let unscheduled = active_items
            .into_iter()
            .map(|item| UnscheduledItem { item, reason: "dependency validation failed".to_string() })
            .collect();
        return AllocationResult { scheduled: Vec::new(), unscheduled, conflicts };
    }

    let mut remaining: Vec<ScheduleItem> = active_items;
    let mut scheduled: Vec<ScheduleItem> = Vec::new();

    let mut current_date = config.current_time.map(|t| LocalDate::from_instant(&t)).unwrap_or_else(|| config.start_date.clone());
    let mut is_first_day = true;

    for _ in 0..config.max_days {
        if let Some(end_date) = &config.end_date {
            if &current_date > end_date {
                break;
            }
        }

        if !config.include_weekends && is_weekend(&current_date) {
            current_date = current_date.next_day();
            continue;
        }

        let Some(pattern) = patterns.iter().find(|p| p.date == current_date) else {
            current_date = current_date.next_day();
            is_first_day = false;
            continue;
        };
        if pattern.blocks.is_empty() {
            current_date = current_date.next_day();
            is_first_day = false;
            continue;
        }

        let mut capacities: Vec<BlockCapacity> = pattern
            .blocks
            .iter()
            .map(|b| {
                let start = instant_at(&current_date, &b.start_time);
                let end = instant_at(&current_date, &b.end_time);
                BlockCapacity::new(b.id.clone(), b.type_config.clone(), start, end, b.total_minutes())
            })
            .collect();
        capacities.sort_by_key(|c| c.start_time);

        if config.respect_meetings {
            for meeting in &pattern.meetings {
                let (start, end) = meeting_instants(&current_date, meeting);
                // Attach to whichever block's timeline the meeting falls in, so
                // find_best_block's gap search (keyed on block_id) sees it as
                // occupying time instead of being invisible to placement.
                let block_id = capacities.iter().find(|cap| cap.start_time < end && start < cap.end_time).map(|cap| cap.block_id.clone());

                let mut item = ScheduleItem::bare(
                    format!("meeting-{}-{}", current_date.as_str(), meeting.id),
                    meeting.name.clone(),
                    ItemKind::Meeting,
                    (end - start).num_minutes(),
                    crate::model::ProvenanceRef::Task { id: meeting.id.clone() },
                );
                item.priority = 1000.0;
                item.locked = true;
                item.start_time = Some(start);
                item.end_time = Some(end);
                item.block_id = block_id;
                scheduled.push(item);
            }
        }

        let day_start_clamp = if is_first_day { config.current_time } else { None };
        let mut placed_any_today = false;

        loop {
            remaining.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal).then_with(|| a.id.cmp(&b.id)));

            let mut placed_this_round = false;

            for index in 0..remaining.len() {
                let item = &remaining[index];
                let Some(ready_at) = dependency_ready_at(item, &completed_ids, &scheduled) else { continue };

                if item.is_waiting_on_async {
                    let parent_id = item.dependency_key().to_string();
                    let wait_minutes = item.async_wait_time.unwrap_or(0);
                    let wait_start = item.completed_at.unwrap_or(ready_at.max(day_start_clamp.unwrap_or(ready_at)));
                    let wait_end = wait_start + Duration::minutes(wait_minutes);

                    let mut wait_item = ScheduleItem::bare(parent_id, format!("{} (waiting)", item.name), ItemKind::AsyncWait, wait_minutes, item.original_ref.clone());
                    wait_item.is_wait_time = true;
                    wait_item.start_time = Some(wait_start);
                    wait_item.end_time = Some(wait_end);
                    wait_item.workflow_id = item.workflow_id.clone();
                    wait_item.workflow_name = item.workflow_name.clone();
                    wait_item.step_index = item.step_index;

                    scheduled.push(wait_item);
                    remaining.remove(index);
                    placed_this_round = true;
                    placed_any_today = true;
                    break;
                }

                let min_start = match day_start_clamp {
                    Some(clamp) => clamp.max(ready_at),
                    None => ready_at,
                };

                let Some(placement) = find_best_block(item, &capacities, &scheduled, min_start) else { continue };

                match placement {
                    Placement::Full { block_index, start } => {
                        let end = start + Duration::minutes(item.duration);
                        let mut placed = remaining.remove(index);
                        placed.start_time = Some(start);
                        placed.end_time = Some(end);
                        placed.block_id = Some(capacities[block_index].block_id.clone());
                        capacities[block_index].record_usage(placed.task_type_id.as_deref(), placed.duration);

                        let async_wait = placed.async_wait_time.filter(|&w| w > 0);
                        if let Some(original_id) = placed.original_task_id.clone() {
                            // This item is the last remaining chunk of a split task and
                            // happened to fit a block whole, skipping the Partial arm
                            // below: finalize here too, or splitTotal never gets set.
                            let part_number = placed.split_part.unwrap_or(1);
                            let base_name = base_name_of(&placed);
                            scheduled.push(placed.clone());
                            finalize_split(&mut scheduled, &original_id, &base_name, part_number);
                        } else {
                            scheduled.push(placed.clone());
                        }

                        if let Some(wait_minutes) = async_wait {
                            let wait_start = end;
                            let wait_end = wait_start + Duration::minutes(wait_minutes);
                            let mut wait_item = ScheduleItem::bare(placed.id.clone(), format!("{} (waiting)", placed.name), ItemKind::AsyncWait, wait_minutes, placed.original_ref.clone());
                            wait_item.is_wait_time = true;
                            wait_item.is_future_wait = true;
                            wait_item.start_time = Some(wait_start);
                            wait_item.end_time = Some(wait_end);
                            wait_item.workflow_id = placed.workflow_id.clone();
                            wait_item.workflow_name = placed.workflow_name.clone();
                            scheduled.push(wait_item);
                        }

                        placed_this_round = true;
                        placed_any_today = true;
                        break;
                    }
                    Placement::Partial { block_index, start, available_minutes } if config.allow_task_splitting => {
                        let original_id = item.dependency_key().to_string();
                        let base_name = base_name_of(item);
                        let part_number = item.split_part.unwrap_or(0) + 1;
                        let state = SplitState { original_id: original_id.clone(), base_name: base_name.clone(), part_number };

                        let part_duration = available_minutes.min(item.duration);
                        let item_owned = remaining.remove(index);
                        let (placed_part, tail) = place_split_part(&item_owned, &state, start, part_duration);

                        capacities[block_index].record_usage(placed_part.task_type_id.as_deref(), placed_part.duration);
                        scheduled.push(placed_part);

                        match tail {
                            Some(tail) => remaining.push(tail),
                            None => finalize_split(&mut scheduled, &original_id, &base_name, part_number),
                        }

                        placed_this_round = true;
                        placed_any_today = true;
                        break;
                    }
                    Placement::Partial { .. } => continue,
                }
            }

            if !placed_this_round {
                break;
            }
        }

        current_date = current_date.next_day();
        is_first_day = false;

        if !placed_any_today {
            let any_ready = remaining.iter().any(|item| dependency_ready_at(item, &completed_ids, &scheduled).is_some());
            if !any_ready {
                break;
            }
        }
    }

    let unscheduled = remaining
        .into_iter()
        .map(|item| {
            let reason = unscheduled_reason(&item, &completed_ids, &scheduled, patterns);
            UnscheduledItem { item, reason }
        })
        .collect();

    AllocationResult { scheduled, unscheduled, conflicts: Vec::new() }
}

/// Surfaces the closed error set for callers that need `Result`-shaped
/// validation ahead of a run (e.g. rejecting malformed `LocalDate`/`LocalTime`
/// inputs before `allocate` ever sees them).
pub fn ensure_valid_horizon(config: &SchedulingConfig) -> Result<(), Error> {
    if let Some(end) = &config.end_date {
        if end < &config.start_date {
            return Err(Error::ResourceConflict(format!("end_date {end} precedes start_date {}", config.start_date)));
        }
    }
    Ok(())
}
