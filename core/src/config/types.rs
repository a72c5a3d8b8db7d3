use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend used when a task does not name one.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Per-backend overrides keyed by backend name ("copilot", "claude").
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_backend() -> String {
    "copilot".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            backends: HashMap::new(),
            executor: ExecutorConfig::default(),
            context: ContextConfig::default(),
            mcp: McpConfig::default(),
            logging: LoggingConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AppConfig {
    /// Settings for one backend, falling back to defaults when the file has no section for it.
    pub fn backend_config(&self, name: &str) -> BackendConfig {
        self.backends.get(name).cloned().unwrap_or_default()
    }
}

/// Invocation knobs for a single backend. Every permission flag is opt-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Executable path override (the `SUBAGENT_<NAME>_PATH` env var still wins).
    #[serde(default)]
    pub executable: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Auto-approve every tool call.
    #[serde(default)]
    pub allow_all_tools: bool,

    /// Auto-approve access to any path (copilot only).
    #[serde(default)]
    pub allow_all_paths: bool,

    /// Turn limit (claude only). Unset means unbounded.
    #[serde(default)]
    pub max_turns: Option<u32>,

    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: f64,

    /// Working directory used when a task has no override. Empty means the current directory.
    #[serde(default)]
    pub default_workspace: Option<String>,

    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Time a timed-out child gets between SIGTERM and SIGKILL.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// Upper bound on waiting for in-flight tasks after a shutdown signal.
    #[serde(default = "default_shutdown_drain_ms")]
    pub shutdown_drain_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout_secs() -> f64 {
    300.0
}

fn default_max_tasks() -> usize {
    10
}

fn default_kill_grace_ms() -> u64 {
    5_000
}

fn default_shutdown_drain_ms() -> u64 {
    30_000
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            default_workspace: None,
            max_tasks: default_max_tasks(),
            kill_grace_ms: default_kill_grace_ms(),
            shutdown_drain_ms: default_shutdown_drain_ms(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_max_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Ceiling for the assembled prompt, kept below the platform argv limit.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    #[serde(default = "default_summary_head_lines")]
    pub summary_head_lines: usize,

    #[serde(default = "default_summary_tail_lines")]
    pub summary_tail_lines: usize,

    #[serde(default = "default_grep_max_matches")]
    pub grep_max_matches: usize,
}

fn default_max_prompt_chars() -> usize {
    if cfg!(windows) {
        // CreateProcess caps the whole command line at 32767 UTF-16 units.
        30_000
    } else {
        100_000
    }
}

fn default_summary_head_lines() -> usize {
    20
}

fn default_summary_tail_lines() -> usize {
    10
}

fn default_grep_max_matches() -> usize {
    50
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            summary_head_lines: default_summary_head_lines(),
            summary_tail_lines: default_summary_tail_lines(),
            grep_max_matches: default_grep_max_matches(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    /// Shared `{"mcpServers": {...}}` document. Read-only; never written by a task.
    #[serde(default)]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "subagent_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// JSONL file path, or `stderr:`.
    pub path: String,
    pub channel_capacity: usize,
    pub drop_when_full: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "./tasks.audit.jsonl".to_string(),
            channel_capacity: 256,
            drop_when_full: true,
        }
    }
}
