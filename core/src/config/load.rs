use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Env var that overrides the configured default backend.
pub const DEFAULT_BACKEND_ENV: &str = "SUBAGENT_DEFAULT_BACKEND";

/// Get the default data directory: ~/.subagent
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".subagent"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.subagent/config.toml (highest)
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    // Relocate the audit log under the data directory if using default
    if cfg.audit.path == "./tasks.audit.jsonl" {
        let audit_dir = data_dir.join("audit");
        std::fs::create_dir_all(&audit_dir)?;
        cfg.audit.path = audit_dir
            .join("tasks.audit.jsonl")
            .to_string_lossy()
            .to_string();
    }

    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);

    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse config {}: {}", path.display(), e))?;
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var(DEFAULT_BACKEND_ENV) {
        if !v.trim().is_empty() {
            cfg.backend = v.trim().to_string();
        }
    }
}
