use std::sync::Arc;

use subagent_core::api::{
    AppConfig, AppContext, BackendRegistry, ExecutionEngine, RetryStrategyPlugin,
    TaskProcessorPlugin,
};

use crate::backend::{ClaudeBackendStrategy, CopilotBackendStrategy};
use crate::executor::{ContextBuilderPlugin, FixedDelayRetryPlugin};

/// The built-in backends. The set is fixed for the life of the process.
pub fn build_registry() -> BackendRegistry {
    BackendRegistry::new()
        .with(Arc::new(CopilotBackendStrategy))
        .with(Arc::new(ClaudeBackendStrategy))
}

pub fn build_retry_strategy(cfg: &AppConfig) -> Arc<dyn RetryStrategyPlugin> {
    Arc::new(FixedDelayRetryPlugin::new(cfg.executor.retry.clone()))
}

pub fn build_processors(_cfg: &AppConfig) -> Vec<Arc<dyn TaskProcessorPlugin>> {
    vec![Arc::new(ContextBuilderPlugin::new())]
}

/// Engine wired with every built-in plugin, tracking tasks in the process-wide active set.
pub fn build_engine(ctx: &AppContext) -> ExecutionEngine {
    let cfg = ctx.cfg();
    ExecutionEngine::builder(ctx)
        .registry(build_registry())
        .processors(build_processors(cfg))
        .retry_strategy(build_retry_strategy(cfg))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_both_backends() {
        let registry = build_registry();
        assert_eq!(registry.names(), vec!["claude", "copilot"]);
        assert!(registry.resolve("gemini").is_err());
    }
}
