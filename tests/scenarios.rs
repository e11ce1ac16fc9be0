//! End-to-end scenarios from the scheduler's external contract: one literal
//! input set per scenario, checked against its expected placement.

use chrono::{TimeZone, Utc};

use task_scheduler_core::allocator::Conflict;
use task_scheduler_core::config::{SchedulingConfig, SchedulingContext, SchedulingPreferences, WorkSettings};
use task_scheduler_core::model::{BlockTypeConfig, DailyWorkPattern, SchedulableInput, Task, WorkBlock, Workflow, WorkflowStep};
use task_scheduler_core::schedule;
use task_scheduler_core::time::{LocalDate, LocalTime};

fn settings() -> WorkSettings {
    WorkSettings {
        default_work_hours_start: LocalTime::parse("09:00").unwrap(),
        default_work_hours_end: LocalTime::parse("17:00").unwrap(),
        default_lunch_start: None,
        default_lunch_duration_minutes: None,
        max_focus_hours: 6.0,
        max_admin_hours: 2.0,
        custom_work_hours: Default::default(),
        custom_capacity: Default::default(),
        timezone: "UTC".to_string(),
    }
}

fn context(start_date: LocalDate, patterns: Vec<DailyWorkPattern>, current_time: chrono::DateTime<Utc>) -> SchedulingContext {
    SchedulingContext {
        start_date: start_date.clone(),
        tasks: Vec::new(),
        workflows: Vec::new(),
        work_patterns: patterns,
        productivity_patterns: Vec::new(),
        scheduling_preferences: SchedulingPreferences::default(),
        work_settings: settings(),
        current_time,
        last_scheduled_item: None,
    }
}

fn one_block_pattern(date: &str, start: &str, end: &str, type_config: BlockTypeConfig) -> DailyWorkPattern {
    DailyWorkPattern {
        date: LocalDate::parse(date).unwrap(),
        blocks: vec![WorkBlock { id: "b1".to_string(), start_time: LocalTime::parse(start).unwrap(), end_time: LocalTime::parse(end).unwrap(), type_config }],
        meetings: Vec::new(),
    }
}

#[test]
fn s1_simple_placement() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let pattern = one_block_pattern("2025-01-10", "09:00", "11:00", BlockTypeConfig::single("focused"));

    let mut t1 = Task::new("t1", "t1", 60);
    t1.importance = Some(5.0);
    t1.urgency = Some(5.0);
    t1.task_type_id = Some("focused".to_string());

    let ctx = context(start_date.clone(), vec![pattern], now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);

    let result = schedule(&[SchedulableInput::Task(t1)], &ctx, &cfg);

    assert_eq!(result.scheduled.len(), 1);
    assert!(result.unscheduled.is_empty());
    let placed = &result.scheduled[0];
    assert_eq!(placed.start_time.unwrap(), Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
    assert_eq!(placed.end_time.unwrap(), Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap());
}

#[test]
fn s2_dependency_ordering_is_not_affected_by_priority() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let pattern = one_block_pattern("2025-01-10", "09:00", "11:00", BlockTypeConfig::single("focused"));

    let mut t1 = Task::new("t1", "t1", 30);
    t1.task_type_id = Some("focused".to_string());
    t1.importance = Some(2.0); // deliberately lower priority than t2

    let mut t2 = Task::new("t2", "t2", 30);
    t2.task_type_id = Some("focused".to_string());
    t2.importance = Some(9.0);
    t2.dependencies = vec!["t1".to_string()];

    let ctx = context(start_date.clone(), vec![pattern], now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);

    let result = schedule(&[SchedulableInput::Task(t1), SchedulableInput::Task(t2)], &ctx, &cfg);

    let placed_t1 = result.scheduled.iter().find(|s| s.id == "t1").unwrap();
    let placed_t2 = result.scheduled.iter().find(|s| s.id == "t2").unwrap();
    assert_eq!(placed_t1.start_time.unwrap(), Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
    assert_eq!(placed_t2.start_time.unwrap(), Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap());
}

#[test]
fn s3_async_wait_rewrites_the_dependent_start_time() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let pattern = one_block_pattern("2025-01-10", "09:00", "13:00", BlockTypeConfig::single("focused"));

    let mut workflow = Workflow::new("wf1", "Deploy");
    let mut s1 = WorkflowStep::new("s1", "Kick off build", 60);
    s1.async_wait_time = 120;
    s1.task_type_id = Some("focused".to_string());
    let mut s2 = WorkflowStep::new("s2", "Verify build", 30);
    s2.task_type_id = Some("focused".to_string());
    s2.dependencies = vec!["s1".to_string()];
    workflow.steps.push(s1);
    workflow.steps.push(s2);

    let ctx = context(start_date.clone(), vec![pattern], now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);

    let result = schedule(&[SchedulableInput::Workflow(workflow)], &ctx, &cfg);

    let s1_item = result.scheduled.iter().find(|s| s.id == "wf1::s1").unwrap();
    assert_eq!(s1_item.start_time.unwrap(), now);
    assert_eq!(s1_item.end_time.unwrap(), now + chrono::Duration::hours(1));

    let wait_item = result.scheduled.iter().find(|s| s.id == "wf1::s1" && s.is_future_wait).unwrap();
    assert_eq!(wait_item.start_time.unwrap(), now + chrono::Duration::hours(1));
    assert_eq!(wait_item.end_time.unwrap(), now + chrono::Duration::hours(3));

    let s2_item = result.scheduled.iter().find(|s| s.id == "wf1::s2").unwrap();
    assert_eq!(s2_item.start_time.unwrap(), wait_item.end_time.unwrap());
}

#[test]
fn s4_dependency_cycle_yields_empty_placement_and_a_conflict() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let pattern = one_block_pattern("2025-01-10", "09:00", "11:00", BlockTypeConfig::single("focused"));

    let mut a = Task::new("a", "a", 30);
    a.task_type_id = Some("focused".to_string());
    a.dependencies = vec!["b".to_string()];
    let mut b = Task::new("b", "b", 30);
    b.task_type_id = Some("focused".to_string());
    b.dependencies = vec!["a".to_string()];

    let ctx = context(start_date.clone(), vec![pattern], now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);

    let result = schedule(&[SchedulableInput::Task(a), SchedulableInput::Task(b)], &ctx, &cfg);

    assert!(result.scheduled.is_empty());
    assert_eq!(result.conflicts.len(), 1);
    match &result.conflicts[0] {
        Conflict::DependencyCycle { ids } => {
            assert!(ids.contains(&"a".to_string()));
            assert!(ids.contains(&"b".to_string()));
        }
        other => panic!("expected a DependencyCycle conflict, got {other:?}"),
    }
}

#[test]
fn s5_multi_day_split_produces_two_parts() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let patterns = vec![
        one_block_pattern("2025-01-10", "09:00", "11:00", BlockTypeConfig::single("focused")),
        one_block_pattern("2025-01-11", "09:00", "11:00", BlockTypeConfig::single("focused")),
    ];

    let mut t1 = Task::new("t1", "t1", 240);
    t1.task_type_id = Some("focused".to_string());

    let ctx = context(start_date.clone(), patterns, now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);
    cfg.max_days = 5;

    let result = schedule(&[SchedulableInput::Task(t1)], &ctx, &cfg);

    let parts: Vec<_> = result.scheduled.iter().filter(|s| s.original_task_id.as_deref() == Some("t1")).collect();
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|p| p.split_total == Some(2)));
    assert!(parts.iter().all(|p| p.duration == 120));
}

#[test]
fn s6_combo_block_tracks_capacity_per_type() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let start_date = LocalDate::parse("2025-01-10").unwrap();
    let pattern = one_block_pattern("2025-01-10", "09:00", "13:00", BlockTypeConfig::combo(vec![("focused", 0.5), ("admin", 0.5)]));

    let mut focused_a = Task::new("focused-a", "focused-a", 80);
    focused_a.task_type_id = Some("focused".to_string());
    focused_a.importance = Some(9.0); // placed first
    let mut focused_b = Task::new("focused-b", "focused-b", 80);
    focused_b.task_type_id = Some("focused".to_string());
    focused_b.importance = Some(8.0);
    let mut admin = Task::new("admin-a", "admin-a", 60);
    admin.task_type_id = Some("admin".to_string());

    let ctx = context(start_date.clone(), vec![pattern], now);
    let mut cfg = SchedulingConfig::new(start_date);
    cfg.current_time = Some(now);
    cfg.allow_task_splitting = false;
    cfg.max_days = 1;

    let result = schedule(&[SchedulableInput::Task(focused_a), SchedulableInput::Task(focused_b), SchedulableInput::Task(admin)], &ctx, &cfg);

    let placed_ids: Vec<&str> = result.scheduled.iter().map(|s| s.id.as_str()).collect();
    assert!(placed_ids.contains(&"focused-a"));
    assert!(placed_ids.contains(&"admin-a"));
    assert!(!placed_ids.contains(&"focused-b"));
    assert_eq!(result.unscheduled.len(), 1);
    assert_eq!(result.unscheduled[0].item.id, "focused-b");
}
