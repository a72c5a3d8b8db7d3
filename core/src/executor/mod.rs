//! Batch execution of agent tasks.
//!
//! ```text
//! Vec<AgentTask>
//!   ↓
//! validate_batch()            (empty / too many / duplicate ids → ExecutorError)
//!   ↓
//! execute_all()               (one tokio task per AgentTask, results kept in order)
//!   ↓ per task
//! processors → run_with_retry(AttemptRunner::run) → audit
//!   ↓
//! BatchResult
//! ```

mod engine;
mod retry;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{resolve_backend_name, validate_batch, ExecutionEngine, ExecutionEngineBuilder};
pub use retry::run_with_retry;
pub use scheduler::execute_all;
pub use types::{AgentTask, BatchResult, ExecutionOpts, TaskResult};
