mod load;
mod types;

pub use load::{
    apply_env_overrides, get_data_dir, load_default, load_from_path, DEFAULT_BACKEND_ENV,
};
pub use types::{
    AppConfig, AuditConfig, BackendConfig, ContextConfig, ExecutorConfig, LoggingConfig,
    McpConfig, RetryConfig,
};
