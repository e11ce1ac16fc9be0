pub mod block;
pub mod block_capacity;
pub mod schedule_item;
pub mod task;
pub mod workflow;

pub use block::{BlockTypeConfig, DailyWorkPattern, TypeAllocation, WorkBlock, WorkMeeting};
pub use block_capacity::BlockCapacity;
pub use schedule_item::{ItemKind, PriorityBreakdown, ProvenanceRef, ScheduleItem};
pub use task::{DeadlineType, Task};
pub use workflow::{StepStatus, Workflow, WorkflowStep};

/// A heterogeneous schedulable input: either a standalone [`Task`] or an
/// entire [`Workflow`] (whose steps are converted individually). A bare step
/// never arrives on its own — it is always owned by a workflow (§9 "Dynamic
/// union of input kinds").
#[derive(Debug, Clone)]
pub enum SchedulableInput {
    Task(Task),
    Workflow(Workflow),
}
