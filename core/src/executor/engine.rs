use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::audit::{AuditRecord, AuditTx};
use crate::backend::{BackendRegistry, BackendStrategy};
use crate::config::{AppConfig, DEFAULT_BACKEND_ENV};
use crate::context::AppContext;
use crate::error::ExecutorError;
use crate::lifecycle::{active_tasks, ActiveTaskSet};
use crate::mcp::{default_ephemeral_dir, resolve_timeout, McpServersDocument};
use crate::runner::{AttemptInput, AttemptRunner};

use super::retry::run_with_retry;
use super::scheduler::execute_all;
use super::traits::{ProcessContext, RetryStrategyPlugin, TaskProcessorPlugin};
use super::types::{AgentTask, BatchResult, ExecutionOpts, TaskResult};

/// Fans a batch of agent tasks out to backend CLIs and gathers the results.
pub struct ExecutionEngine {
    ctx: AppContext,
    registry: BackendRegistry,
    processors: Vec<Arc<dyn TaskProcessorPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    active_tasks: Arc<ActiveTaskSet>,
    ephemeral_dir: PathBuf,
}

pub struct ExecutionEngineBuilder {
    ctx: AppContext,
    registry: BackendRegistry,
    processors: Vec<Arc<dyn TaskProcessorPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    active_tasks: Option<Arc<ActiveTaskSet>>,
    ephemeral_dir: Option<PathBuf>,
}

/// Everything one task needs, shared across the spawned task futures of a batch.
struct BatchShared {
    run_id: String,
    cfg: Arc<AppConfig>,
    opts: ExecutionOpts,
    registry: BackendRegistry,
    processors: Vec<Arc<dyn TaskProcessorPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    active_tasks: Arc<ActiveTaskSet>,
    mcp_doc: Option<Arc<McpServersDocument>>,
    ephemeral_dir: PathBuf,
    audit: Option<AuditTx>,
}

impl ExecutionEngine {
    pub fn builder(ctx: &AppContext) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(ctx)
    }

    pub fn active_tasks(&self) -> Arc<ActiveTaskSet> {
        self.active_tasks.clone()
    }

    /// Run every task in `tasks` concurrently.
    ///
    /// Only batch-shape problems are errors, and they are raised before anything is spawned.
    /// Per-task failures (unknown backend, spawn error, timeout, non-zero exit) land in the
    /// corresponding slot of the returned [`BatchResult`], which keeps submission order.
    pub async fn run_batch(
        &self,
        tasks: Vec<AgentTask>,
        opts: &ExecutionOpts,
    ) -> Result<BatchResult, ExecutorError> {
        validate_batch(&tasks, self.ctx.cfg().executor.max_tasks)?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Instant::now();
        tracing::info!(
            run_id = %run_id,
            total = tasks.len(),
            default_timeout_secs = opts.default_timeout_secs,
            workspace = %opts.default_workspace.display(),
            "batch started"
        );

        let mcp_doc = self.load_mcp_document(&tasks).await;

        let shared = Arc::new(BatchShared {
            run_id: run_id.clone(),
            cfg: self.ctx.cfg_arc(),
            opts: opts.clone(),
            registry: self.registry.clone(),
            processors: self.processors.clone(),
            retry_strategy: self.retry_strategy.clone(),
            active_tasks: self.active_tasks.clone(),
            mcp_doc,
            ephemeral_dir: self.ephemeral_dir.clone(),
            audit: self.ctx.audit(),
        });

        let results = execute_all(tasks, move |task| {
            let shared = shared.clone();
            async move { execute_task(shared, task).await }
        })
        .await;

        let batch = BatchResult::from_results(results, started_at.elapsed().as_millis() as u64);
        tracing::info!(
            run_id = %run_id,
            total = batch.total,
            completed = batch.completed,
            failed = batch.failed,
            duration_ms = batch.duration_ms,
            "batch finished"
        );
        Ok(batch)
    }

    /// Read the shared server document once per batch, and only if some task asks for servers.
    async fn load_mcp_document(&self, tasks: &[AgentTask]) -> Option<Arc<McpServersDocument>> {
        if tasks.iter().all(|t| t.mcp_servers.is_empty()) {
            return None;
        }
        let path = self
            .ctx
            .cfg()
            .mcp
            .config_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())?;

        match McpServersDocument::load(std::path::Path::new(path)).await {
            Ok(doc) => Some(Arc::new(doc)),
            Err(e) => {
                tracing::warn!(error = %e, "mcp config unavailable, tasks run without servers");
                None
            }
        }
    }
}

impl ExecutionEngineBuilder {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            ctx: ctx.clone(),
            registry: BackendRegistry::new(),
            processors: Vec::new(),
            retry_strategy: None,
            active_tasks: None,
            ephemeral_dir: None,
        }
    }

    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn BackendStrategy>) -> Self {
        self.registry.register(backend);
        self
    }

    pub fn processors(mut self, processors: Vec<Arc<dyn TaskProcessorPlugin>>) -> Self {
        self.processors = processors;
        // Higher priority runs first.
        self.processors.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Track in-flight tasks in `set` instead of the process-wide one.
    pub fn active_tasks(mut self, set: Arc<ActiveTaskSet>) -> Self {
        self.active_tasks = Some(set);
        self
    }

    pub fn ephemeral_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ephemeral_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            ctx: self.ctx,
            registry: self.registry,
            processors: self.processors,
            retry_strategy: self.retry_strategy,
            active_tasks: self.active_tasks.unwrap_or_else(active_tasks),
            ephemeral_dir: self.ephemeral_dir.unwrap_or_else(default_ephemeral_dir),
        }
    }
}

/// Reject batches that are empty, too large, or contain malformed / duplicate tasks.
pub fn validate_batch(tasks: &[AgentTask], max_tasks: usize) -> Result<(), ExecutorError> {
    if tasks.is_empty() {
        return Err(ExecutorError::EmptyBatch);
    }
    if tasks.len() > max_tasks {
        return Err(ExecutorError::TooManyTasks {
            count: tasks.len(),
            limit: max_tasks,
        });
    }

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if task.id.trim().is_empty() {
            return Err(ExecutorError::InvalidTask {
                task_id: task.id.clone(),
                reason: "task id must not be empty".to_string(),
            });
        }
        if task.prompt.trim().is_empty() {
            return Err(ExecutorError::InvalidTask {
                task_id: task.id.clone(),
                reason: "prompt must not be empty".to_string(),
            });
        }
        if !seen.insert(task.id.as_str()) {
            return Err(ExecutorError::DuplicateTaskId(task.id.clone()));
        }
    }
    Ok(())
}

/// Backend name for `task`: its own choice, then the env override, then the config default.
pub fn resolve_backend_name(task: &AgentTask, cfg: &AppConfig) -> String {
    if let Some(name) = task.backend.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return name.to_string();
    }
    if let Ok(name) = std::env::var(DEFAULT_BACKEND_ENV) {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    cfg.backend.clone()
}

async fn execute_task(shared: Arc<BatchShared>, task: AgentTask) -> TaskResult {
    // Removed on every exit path, panics included.
    let _guard = shared.active_tasks.track(&task.id);
    let started_at = Instant::now();

    let backend_name = resolve_backend_name(&task, &shared.cfg);
    tracing::info!(
        run_id = %shared.run_id,
        task_id = %task.id,
        backend = %backend_name,
        mcp_servers = ?task.mcp_servers,
        "task started"
    );

    let mut result = run_task(&shared, &task, &backend_name, started_at).await;
    result.backend = Some(backend_name);
    result.mcp_servers = task.mcp_servers.clone();

    if result.success {
        tracing::info!(
            task_id = %task.id,
            duration_ms = result.duration_ms,
            attempts = result.attempts,
            tokens = ?result.tokens,
            "task succeeded"
        );
    } else {
        tracing::warn!(
            task_id = %task.id,
            duration_ms = result.duration_ms,
            attempts = result.attempts,
            error = %result.error_text(),
            "task failed"
        );
    }

    if let Some(audit) = &shared.audit {
        let record = AuditRecord::from_result(&shared.run_id, &task, &result);
        audit.send_line(record.to_json_line()).await;
    }

    result
}

async fn run_task(
    shared: &BatchShared,
    task: &AgentTask,
    backend_name: &str,
    started_at: Instant,
) -> TaskResult {
    let backend = match shared.registry.resolve(backend_name) {
        Ok(backend) => backend,
        Err(msg) => {
            return TaskResult::failed(&task.id, msg, started_at.elapsed().as_millis() as u64);
        }
    };

    let workspace = task
        .workspace
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| shared.opts.default_workspace.clone());

    let mut prompt = task.prompt.clone();
    let mut context_files = Vec::new();
    if !shared.processors.is_empty() {
        let process_ctx = ProcessContext {
            run_id: shared.run_id.clone(),
            workspace: workspace.clone(),
            app_config: shared.cfg.clone(),
        };
        for processor in &shared.processors {
            let mut staged = task.clone();
            staged.prompt = prompt.clone();
            match processor.process(&staged, &process_ctx).await {
                Ok(processed) => {
                    prompt = processed.enhanced_content;
                    context_files.extend(processed.metadata.files.into_iter().map(|f| f.path));
                }
                Err(e) => {
                    let mut failed = TaskResult::failed(
                        &task.id,
                        format!("Task preparation failed ({}): {}", processor.name(), e),
                        started_at.elapsed().as_millis() as u64,
                    );
                    failed.context_files = context_files;
                    return failed;
                }
            }
        }
    }

    let timeout = resolve_timeout(
        task.timeout_seconds,
        shared.opts.default_timeout_secs,
        &task.mcp_servers,
    );
    let runner = AttemptRunner::new(
        backend,
        shared.cfg.backend_config(backend_name),
        shared.mcp_doc.clone(),
        shared.ephemeral_dir.clone(),
        Duration::from_millis(shared.cfg.executor.kill_grace_ms),
    );
    let input = AttemptInput {
        task_id: &task.id,
        prompt: &prompt,
        mcp_servers: &task.mcp_servers,
        cwd: &workspace,
        timeout,
    };

    let runner_ref = &runner;
    let input_ref = &input;
    let mut result = run_with_retry(
        &task.id,
        shared.retry_strategy.as_deref(),
        move |_attempt| runner_ref.run(input_ref),
    )
    .await;
    result.context_files = context_files;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_batches() {
        assert_eq!(validate_batch(&[], 10), Err(ExecutorError::EmptyBatch));

        let many: Vec<AgentTask> = (0..11).map(|i| AgentTask::new(format!("t{i}"), "p")).collect();
        assert_eq!(
            validate_batch(&many, 10),
            Err(ExecutorError::TooManyTasks { count: 11, limit: 10 })
        );

        let dup = vec![AgentTask::new("a", "p"), AgentTask::new("a", "q")];
        assert_eq!(
            validate_batch(&dup, 10),
            Err(ExecutorError::DuplicateTaskId("a".to_string()))
        );

        let blank = vec![AgentTask::new("a", "  ")];
        assert!(matches!(
            validate_batch(&blank, 10),
            Err(ExecutorError::InvalidTask { .. })
        ));

        let ok = vec![AgentTask::new("a", "p"), AgentTask::new("b", "p")];
        assert_eq!(validate_batch(&ok, 10), Ok(()));
    }

    #[test]
    fn task_backend_overrides_config_default() {
        let cfg = AppConfig::default();
        let task = AgentTask::new("a", "p").with_backend("claude");
        assert_eq!(resolve_backend_name(&task, &cfg), "claude");
    }
}
