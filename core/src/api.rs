//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `subagent_core::api` instead of reaching into internal modules.

pub use crate::audit::{AuditRecord, AuditTx};
pub use crate::backend::{
    resolve_executable, BackendOptions, BackendRegistry, BackendStrategy, ParsedOutput,
};
pub use crate::config::{
    load_default, load_from_path, AppConfig, BackendConfig, ContextConfig, ExecutorConfig,
    LoggingConfig, McpConfig, RetryConfig,
};
pub use crate::context::AppContext;
pub use crate::error::{CliError, ExecutorError, RunnerError};
pub use crate::executor::traits::{
    is_transient_error, FileInfo, ProcessContext, ProcessMetadata, ProcessedTask,
    RetryStrategyPlugin, TaskProcessorPlugin,
};
pub use crate::executor::types::{
    AgentTask, BatchResult, ExecutionOpts, FileMode, FileRef, ProcessorError, TaskContext,
    TaskResult, TokenUsage,
};
pub use crate::executor::{ExecutionEngine, ExecutionEngineBuilder};
pub use crate::lifecycle::{active_task_ids, active_tasks, wait_for_drain, ActiveTaskSet};
pub use crate::mcp::{EphemeralConfig, McpServersDocument};
