#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use subagent_core::api::{
    ActiveTaskSet, AppConfig, AppContext, BackendOptions, BackendStrategy, ExecutionEngine,
    ExecutionOpts, ParsedOutput, RetryStrategyPlugin,
};

/// Treats the prompt as a shell script: `sh -c <prompt>`.
pub struct ShellBackend;

impl BackendStrategy for ShellBackend {
    fn name(&self) -> &str {
        "shell"
    }

    fn default_executable(&self) -> &str {
        "sh"
    }

    fn build_args(&self, prompt: &str, _options: &BackendOptions) -> Vec<String> {
        vec!["-c".to_string(), prompt.to_string()]
    }

    fn parse_output(&self, stdout: &str, _stderr: &str, _exit_code: i32) -> ParsedOutput {
        ParsedOutput::text(stdout.trim())
    }
}

/// A backend whose executable does not exist.
pub struct MissingBackend;

impl BackendStrategy for MissingBackend {
    fn name(&self) -> &str {
        "missing"
    }

    fn default_executable(&self) -> &str {
        "/nonexistent/subagent-test-agent"
    }

    fn build_args(&self, prompt: &str, _options: &BackendOptions) -> Vec<String> {
        vec![prompt.to_string()]
    }

    fn parse_output(&self, stdout: &str, _stderr: &str, _exit_code: i32) -> ParsedOutput {
        ParsedOutput::text(stdout)
    }
}

/// Retries transient failures immediately.
pub struct ImmediateRetry;

impl RetryStrategyPlugin for ImmediateRetry {
    fn name(&self) -> &str {
        "immediate"
    }

    fn next_delay(&self, _attempt: u32, _error: &str) -> Option<Duration> {
        Some(Duration::ZERO)
    }

    fn max_attempts(&self) -> u32 {
        2
    }
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.backend = "shell".to_string();
    cfg.audit.enabled = false;
    cfg.executor.kill_grace_ms = 200;
    cfg
}

pub struct Harness {
    pub engine: ExecutionEngine,
    pub active: Arc<ActiveTaskSet>,
}

pub fn harness(cfg: AppConfig, retry: bool) -> Harness {
    let ctx = AppContext::without_audit(cfg);
    engine_for(&ctx, retry)
}

pub fn engine_for(ctx: &AppContext, retry: bool) -> Harness {
    let active = Arc::new(ActiveTaskSet::new());
    let mut builder = ExecutionEngine::builder(ctx)
        .backend(Arc::new(ShellBackend))
        .backend(Arc::new(MissingBackend))
        .active_tasks(active.clone());
    if retry {
        builder = builder.retry_strategy(Arc::new(ImmediateRetry));
    }
    Harness {
        engine: builder.build(),
        active,
    }
}

pub fn opts() -> ExecutionOpts {
    ExecutionOpts::new(30.0, std::env::temp_dir())
}
