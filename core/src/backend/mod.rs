//! Backend strategies: how to invoke one agent CLI non-interactively and read its answer.
//!
//! Each backend is a small strategy object; the runner never branches on backend names.
//! Adding a backend means implementing [`BackendStrategy`] and registering it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::executor::types::TokenUsage;
use crate::mcp::McpServersDocument;

/// Invocation options resolved for one attempt.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    pub model: Option<String>,
    pub allow_all_tools: bool,
    pub allow_all_paths: bool,
    pub max_turns: Option<u32>,
    /// Ephemeral auxiliary-server config written for this attempt, if any.
    pub mcp_config_path: Option<PathBuf>,
}

impl BackendOptions {
    pub fn from_config(cfg: &BackendConfig, mcp_config_path: Option<PathBuf>) -> Self {
        Self {
            model: cfg
                .model
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            allow_all_tools: cfg.allow_all_tools,
            allow_all_paths: cfg.allow_all_paths,
            max_turns: cfg.max_turns,
            mcp_config_path,
        }
    }
}

/// Normalized answer recovered from a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub output: String,
    pub tokens: Option<TokenUsage>,
}

impl ParsedOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            tokens: None,
        }
    }
}

pub trait BackendStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Executable used when neither the env var nor the config file overrides it.
    fn default_executable(&self) -> &str;

    fn build_args(&self, prompt: &str, options: &BackendOptions) -> Vec<String>;

    /// Environment added on top of the inherited one.
    fn build_env(
        &self,
        _mcp_config_path: Option<&Path>,
        base_env: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        base_env.clone()
    }

    fn parse_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> ParsedOutput;

    /// Escape hatch for requested servers this backend cannot wire into the child process:
    /// describe a workaround in the prompt instead of dropping the capability silently.
    fn augment_prompt_for_mcp(&self, prompt: &str, _servers: &[String]) -> String {
        prompt.to_string()
    }

    /// Turn the generic auxiliary-server document into this backend's file format.
    fn prepare_mcp_config(&self, doc: &McpServersDocument) -> serde_json::Value {
        doc.to_value()
    }

    /// Env var consulted first when resolving the executable, e.g. `SUBAGENT_CLAUDE_PATH`.
    fn executable_env_var(&self) -> String {
        format!(
            "SUBAGENT_{}_PATH",
            self.name().to_uppercase().replace('-', "_")
        )
    }
}

/// Fixed, name-keyed set of backends built once at startup.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn BackendStrategy>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: Arc<dyn BackendStrategy>) -> Self {
        self.register(backend);
        self
    }

    pub fn register(&mut self, backend: Arc<dyn BackendStrategy>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BackendStrategy>> {
        self.backends.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Look up `name`, or explain which backends exist.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn BackendStrategy>, String> {
        self.get(name).ok_or_else(|| {
            format!(
                "Unknown backend '{}'. Available backends: {}",
                name,
                self.names().join(", ")
            )
        })
    }
}

/// Executable resolution: env var override, then config override, then the built-in default.
/// First match wins; blank values are ignored.
pub fn resolve_executable(backend: &dyn BackendStrategy, cfg: &BackendConfig) -> String {
    if let Ok(v) = std::env::var(backend.executable_env_var()) {
        if !v.trim().is_empty() {
            return v.trim().to_string();
        }
    }
    if let Some(exe) = cfg
        .executable
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return exe.to_string();
    }
    backend.default_executable().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    impl BackendStrategy for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn default_executable(&self) -> &str {
            "echo"
        }

        fn build_args(&self, prompt: &str, _options: &BackendOptions) -> Vec<String> {
            vec![prompt.to_string()]
        }

        fn parse_output(&self, stdout: &str, _stderr: &str, _exit_code: i32) -> ParsedOutput {
            ParsedOutput::text(stdout.trim())
        }
    }

    #[test]
    fn unknown_backend_lists_registered_names() {
        let registry = BackendRegistry::new()
            .with(Arc::new(Echo("beta")))
            .with(Arc::new(Echo("alpha")));

        assert!(registry.get("alpha").is_some());
        let err = registry.resolve("gamma").err().unwrap();
        assert_eq!(err, "Unknown backend 'gamma'. Available backends: alpha, beta");
    }

    #[test]
    fn executable_env_var_is_derived_from_name() {
        assert_eq!(Echo("my-agent").executable_env_var(), "SUBAGENT_MY_AGENT_PATH");
    }

    #[test]
    fn executable_resolution_prefers_env_then_config() {
        let backend = Echo("resolve-test");
        let mut cfg = BackendConfig::default();
        assert_eq!(resolve_executable(&backend, &cfg), "echo");

        cfg.executable = Some("/opt/agent".to_string());
        assert_eq!(resolve_executable(&backend, &cfg), "/opt/agent");

        std::env::set_var("SUBAGENT_RESOLVE_TEST_PATH", "/usr/local/bin/agent");
        assert_eq!(resolve_executable(&backend, &cfg), "/usr/local/bin/agent");
        std::env::remove_var("SUBAGENT_RESOLVE_TEST_PATH");
    }

    #[test]
    fn options_ignore_blank_model() {
        let cfg = BackendConfig {
            model: Some("  ".to_string()),
            ..BackendConfig::default()
        };
        assert!(BackendOptions::from_config(&cfg, None).model.is_none());
    }
}
