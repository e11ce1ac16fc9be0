//! Item Converter (C5): turns the heterogeneous [`SchedulableInput`] list
//! into the uniform [`ScheduleItem`] representation every downstream
//! component (priority engine, graph, allocator) operates on.

use std::collections::HashSet;

use crate::model::{ItemKind, ProvenanceRef, SchedulableInput, ScheduleItem, StepStatus, Task, Workflow, WorkflowStep};

/// A workflow step's id is namespaced under its workflow so that two
/// workflows using the same step id (e.g. both calling a step "review")
/// never collide in the flat item/dependency space.
pub fn workflow_item_id(workflow_id: &str, step_id: &str) -> String {
    format!("{workflow_id}::{step_id}")
}

pub struct ConversionResult {
    pub items: Vec<ScheduleItem>,
    /// Ids (already namespaced, for workflow steps) of items that are
    /// already done and therefore excluded from placement but still present
    /// in the dependency graph so dependents resolve correctly.
    pub completed_item_ids: Vec<String>,
}

/// Converts every input into one or more [`ScheduleItem`]s, deduplicating by
/// id (first occurrence wins; later duplicates are dropped with a warning,
/// mirroring the "last write doesn't silently clobber state" posture of the
/// rest of the engine).
pub fn convert_inputs(inputs: &[SchedulableInput]) -> ConversionResult {
    let mut items = Vec::new();
    let mut completed_item_ids = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for input in inputs {
        match input {
            SchedulableInput::Task(task) => {
                let item = convert_task(task);
                push_unique(&mut items, &mut seen_ids, item, &mut completed_item_ids);
            }
            SchedulableInput::Workflow(workflow) => {
                for (index, step) in workflow.steps.iter().enumerate() {
                    let item = convert_step(workflow, step, index);
                    push_unique(&mut items, &mut seen_ids, item, &mut completed_item_ids);
                }
            }
        }
    }

    ConversionResult { items, completed_item_ids }
}

fn push_unique(items: &mut Vec<ScheduleItem>, seen_ids: &mut HashSet<String>, item: ScheduleItem, completed_item_ids: &mut Vec<String>) {
    if !seen_ids.insert(item.id.clone()) {
        log::warn!("dropping duplicate schedulable item id {:?}", item.id);
        return;
    }
    if item.completed {
        completed_item_ids.push(item.id.clone());
    }
    items.push(item);
}

fn convert_task(task: &Task) -> ScheduleItem {
    let mut item = ScheduleItem::bare(task.id.clone(), task.name.clone(), ItemKind::Task, task.duration, ProvenanceRef::Task { id: task.id.clone() });

    item.importance = Some(task.importance_or_default());
    item.urgency = Some(task.urgency_or_default());
    item.cognitive_complexity = Some(task.cognitive_complexity_or_default());
    item.task_type_id = task.task_type_id.clone();
    item.deadline = task.deadline;
    item.deadline_type = task.deadline_type;
    item.dependencies = task.dependencies.clone();
    item.async_wait_time = Some(task.async_wait_time);
    item.completed = task.completed;
    item.completed_at = task.completed_at;
    item.is_waiting_on_async = task.is_waiting_on_async;

    item
}

fn convert_step(workflow: &Workflow, step: &WorkflowStep, index: usize) -> ScheduleItem {
    let id = workflow_item_id(&workflow.id, &step.id);
    let original_ref = ProvenanceRef::WorkflowStep {
        workflow_id: workflow.id.clone(),
        workflow_name: workflow.name.clone(),
        step_index: index,
    };

    let mut item = ScheduleItem::bare(id, step.name.clone(), ItemKind::WorkflowStep, step.duration, original_ref);

    item.importance = Some(step.importance.unwrap_or_else(|| workflow.importance_or_default()));
    item.urgency = Some(step.urgency.unwrap_or_else(|| workflow.urgency_or_default()));
    item.cognitive_complexity = Some(step.cognitive_complexity.unwrap_or(3));
    item.task_type_id = step.task_type_id.clone();
    item.deadline = workflow.deadline;
    item.deadline_type = workflow.deadline_type;
    item.dependencies = step.dependencies.iter().map(|dep| workflow_item_id(&workflow.id, dep)).collect();
    item.async_wait_time = Some(step.async_wait_time);
    // Skipped steps are terminal the same as Completed ones: dependents must
    // treat them as satisfied, even though nothing was ever actually done.
    item.completed = matches!(step.status, StepStatus::Completed | StepStatus::Skipped);
    item.completed_at = step.completed_at;
    item.is_waiting_on_async = step.is_waiting_on_async();
    item.workflow_id = Some(workflow.id.clone());
    item.workflow_name = Some(workflow.name.clone());
    item.step_index = Some(index);

    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeadlineType, StepStatus};

    #[test]
    fn converts_a_bare_task_one_to_one() {
        let mut task = Task::new("t1", "Write report", 60);
        task.importance = Some(8.0);
        let result = convert_inputs(&[SchedulableInput::Task(task)]);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].importance, Some(8.0));
        assert_eq!(result.items[0].urgency, Some(5.0));
    }

    #[test]
    fn namespaces_workflow_step_ids_and_dependencies() {
        let mut workflow = Workflow::new("wf1", "Launch");
        let mut a = WorkflowStep::new("a", "Draft", 30);
        let mut b = WorkflowStep::new("b", "Review", 30);
        b.dependencies = vec!["a".to_string()];
        workflow.steps.push(a.clone());
        workflow.steps.push(b.clone());
        let _ = &mut a;

        let result = convert_inputs(&[SchedulableInput::Workflow(workflow)]);
        assert_eq!(result.items[0].id, "wf1::a");
        assert_eq!(result.items[1].id, "wf1::b");
        assert_eq!(result.items[1].dependencies, vec!["wf1::a".to_string()]);
    }

    #[test]
    fn inherits_importance_and_urgency_from_parent_workflow() {
        let mut workflow = Workflow::new("wf1", "Launch");
        workflow.importance = Some(9.0);
        workflow.urgency = Some(2.0);
        let step = WorkflowStep::new("a", "Draft", 30);
        workflow.steps.push(step);

        let result = convert_inputs(&[SchedulableInput::Workflow(workflow)]);
        assert_eq!(result.items[0].importance, Some(9.0));
        assert_eq!(result.items[0].urgency, Some(2.0));
    }

    #[test]
    fn step_deadline_always_comes_from_the_workflow() {
        let mut workflow = Workflow::new("wf1", "Launch");
        workflow.deadline_type = Some(DeadlineType::Hard);
        let step = WorkflowStep::new("a", "Draft", 30);
        workflow.steps.push(step);

        let result = convert_inputs(&[SchedulableInput::Workflow(workflow)]);
        assert_eq!(result.items[0].deadline_type, Some(DeadlineType::Hard));
    }

    #[test]
    fn completed_and_skipped_steps_are_both_reported_as_completed() {
        let mut workflow = Workflow::new("wf1", "Launch");
        let mut done = WorkflowStep::new("a", "Draft", 30);
        done.status = StepStatus::Completed;
        let mut skipped = WorkflowStep::new("b", "Optional", 30);
        skipped.status = StepStatus::Skipped;
        workflow.steps.push(done);
        workflow.steps.push(skipped);

        let result = convert_inputs(&[SchedulableInput::Workflow(workflow)]);
        assert_eq!(result.completed_item_ids, vec!["wf1::a".to_string(), "wf1::b".to_string()]);
    }

    #[test]
    fn duplicate_ids_across_inputs_keep_the_first_occurrence() {
        let task_a = Task::new("dup", "First", 10);
        let task_b = Task::new("dup", "Second", 20);
        let result = convert_inputs(&[SchedulableInput::Task(task_a), SchedulableInput::Task(task_b)]);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "First");
    }
}
