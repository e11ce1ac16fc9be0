use thiserror::Error;

/// The closed error taxonomy for the scheduler core.
///
/// Only the `InvalidLocalTime`/`InvalidLocalDate` variants are ever returned
/// through `?` from factory functions. Everything else is reserved for
/// producers that want to surface a scheduling-time problem through a
/// `Conflict` in `ScheduleResult` rather than aborting the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid local time {0:?}: does not match HH:MM (00-23:00-59)")]
    InvalidLocalTime(String),

    #[error("invalid local date {0:?}: does not match YYYY-MM-DD")]
    InvalidLocalDate(String),

    #[error("dependency cycle detected among: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("missing dependency {dependency:?} referenced by {dependent:?}")]
    MissingDependency { dependent: String, dependency: String },

    #[error("capacity exceeded for block {0:?}")]
    CapacityExceeded(String),

    #[error("deadline impossible to meet for item {0:?}")]
    DeadlineImpossible(String),

    #[error("resource conflict: {0}")]
    ResourceConflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
