use thiserror::Error;

/// Batch validation errors. Raised before any task is dispatched; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Batch contains no tasks")]
    EmptyBatch,

    #[error("Too many tasks: {count} submitted (limit: {limit})")]
    TooManyTasks { count: usize, limit: usize },

    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Invalid task '{task_id}': {reason}")]
    InvalidTask { task_id: String, reason: String },
}
