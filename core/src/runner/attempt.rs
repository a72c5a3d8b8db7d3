use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{resolve_executable, BackendOptions, BackendStrategy};
use crate::config::BackendConfig;
use crate::executor::types::TaskResult;
use crate::mcp::{EphemeralConfig, McpServersDocument};

use super::run::run_process;
use super::types::{ProcessStatus, RunnerStartArgs};

/// Per-task view of one attempt: what to send and where to run it.
#[derive(Debug, Clone)]
pub struct AttemptInput<'a> {
    pub task_id: &'a str,
    /// Prompt after context assembly.
    pub prompt: &'a str,
    pub mcp_servers: &'a [String],
    pub cwd: &'a Path,
    pub timeout: Duration,
}

/// Runs single attempts of a task against one backend.
#[derive(Clone)]
pub struct AttemptRunner {
    backend: Arc<dyn BackendStrategy>,
    backend_cfg: BackendConfig,
    mcp_doc: Option<Arc<McpServersDocument>>,
    ephemeral_dir: PathBuf,
    kill_grace: Duration,
}

impl AttemptRunner {
    pub fn new(
        backend: Arc<dyn BackendStrategy>,
        backend_cfg: BackendConfig,
        mcp_doc: Option<Arc<McpServersDocument>>,
        ephemeral_dir: PathBuf,
        kill_grace: Duration,
    ) -> Self {
        Self {
            backend,
            backend_cfg,
            mcp_doc,
            ephemeral_dir,
            kill_grace,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One spawn of the backend CLI. Never returns an error: every failure is a failed result.
    pub async fn run(&self, input: &AttemptInput<'_>) -> TaskResult {
        let started_at = Instant::now();
        let backend = self.backend.as_ref();

        // Held until the end of the attempt; dropping it deletes the file.
        let mut ephemeral: Option<EphemeralConfig> = None;
        let mut prompt = input.prompt.to_string();

        if !input.mcp_servers.is_empty() {
            match self.mcp_doc.as_deref() {
                Some(doc) => {
                    let (subset, missing) = doc.select(input.mcp_servers);
                    if !missing.is_empty() {
                        tracing::warn!(
                            task_id = %input.task_id,
                            missing = ?missing,
                            "requested mcp servers not found in config"
                        );
                    }
                    if !subset.is_empty() {
                        let value = backend.prepare_mcp_config(&subset);
                        match EphemeralConfig::write(&self.ephemeral_dir, input.task_id, &value)
                            .await
                        {
                            Ok(cfg) => ephemeral = Some(cfg),
                            Err(e) => {
                                return TaskResult::failed(
                                    input.task_id,
                                    format!("Failed to write MCP config: {}", e),
                                    elapsed_ms(started_at),
                                );
                            }
                        }
                    }
                }
                None => tracing::warn!(
                    task_id = %input.task_id,
                    servers = ?input.mcp_servers,
                    "mcp servers requested but no config document is available"
                ),
            }
            prompt = backend.augment_prompt_for_mcp(&prompt, input.mcp_servers);
        }

        let mcp_path = ephemeral.as_ref().map(|c| c.path().to_path_buf());
        let options = BackendOptions::from_config(&self.backend_cfg, mcp_path.clone());
        let args = RunnerStartArgs {
            cmd: resolve_executable(backend, &self.backend_cfg),
            args: backend.build_args(&prompt, &options),
            envs: backend.build_env(mcp_path.as_deref(), &self.backend_cfg.env),
            cwd: Some(input.cwd.to_path_buf()),
        };

        tracing::info!(
            task_id = %input.task_id,
            backend = %backend.name(),
            cmd = %args.cmd,
            timeout_secs = input.timeout.as_secs_f64(),
            mcp_config = ?mcp_path,
            "attempt started"
        );

        let outcome = run_process(&args, input.timeout, self.kill_grace, input.task_id).await;
        let duration_ms = elapsed_ms(started_at);

        let result = match outcome.status {
            ProcessStatus::TimedOut => TaskResult::failed(
                input.task_id,
                format!(
                    "Timeout: task '{}' exceeded {}s limit",
                    input.task_id,
                    input.timeout.as_secs_f64()
                ),
                duration_ms,
            ),
            ProcessStatus::SpawnFailed(msg) => TaskResult::failed(input.task_id, msg, duration_ms),
            ProcessStatus::Exited(0) => {
                let parsed = backend.parse_output(&outcome.stdout, &outcome.stderr, 0);
                TaskResult::succeeded(input.task_id, parsed.output, parsed.tokens, duration_ms)
            }
            ProcessStatus::Exited(code) => {
                let partial = backend.parse_output(&outcome.stdout, &outcome.stderr, code);
                if !partial.output.is_empty() {
                    tracing::debug!(
                        task_id = %input.task_id,
                        exit_code = code,
                        partial = %crate::util::preview(&partial.output, 200),
                        "discarding output of failed attempt"
                    );
                }
                let stderr = outcome.stderr.trim();
                let error = if stderr.is_empty() {
                    format!("Process exited with code {}", code)
                } else {
                    stderr.to_string()
                };
                TaskResult::failed(input.task_id, error, duration_ms)
            }
        };

        drop(ephemeral);
        result
    }
}

fn elapsed_ms(started_at: Instant) -> u64 {
    started_at.elapsed().as_millis() as u64
}
