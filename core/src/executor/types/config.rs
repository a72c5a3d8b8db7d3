use std::path::PathBuf;

/// Per-call execution options supplied by the hosting front end.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Timeout for tasks that do not set `timeout_seconds`.
    pub default_timeout_secs: f64,

    /// Working directory for tasks without a `workspace` override.
    pub default_workspace: PathBuf,
}

impl ExecutionOpts {
    pub fn new(default_timeout_secs: f64, default_workspace: impl Into<PathBuf>) -> Self {
        Self {
            default_timeout_secs,
            default_workspace: default_workspace.into(),
        }
    }

    pub fn from_config(cfg: &crate::config::ExecutorConfig) -> Self {
        let workspace = cfg
            .default_workspace
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(cfg.default_timeout_secs, workspace)
    }
}
