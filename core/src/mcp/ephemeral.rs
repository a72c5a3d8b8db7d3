use std::path::{Path, PathBuf};

/// Directory holding per-attempt config files: `<temp>/subagent-mcp`.
pub fn default_ephemeral_dir() -> PathBuf {
    std::env::temp_dir().join("subagent-mcp")
}

/// A config file written for exactly one attempt. Removed when dropped, whatever the outcome.
#[derive(Debug)]
pub struct EphemeralConfig {
    path: PathBuf,
}

impl EphemeralConfig {
    /// Write `value` to `<dir>/<task-id>-<millis>-<nonce>.json`.
    pub async fn write(
        dir: &Path,
        task_id: &str,
        value: &serde_json::Value,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}.json",
            sanitize_file_stem(task_id),
            chrono::Utc::now().timestamp_millis(),
            &nonce[..8]
        );
        let path = dir.join(file_name);

        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        // Own the path before writing so a partial write is still cleaned up.
        let guard = Self { path };
        tokio::fs::write(&guard.path, body).await?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralConfig {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed ephemeral mcp config"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove ephemeral mcp config"
            ),
        }
    }
}

fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();
    if stem.is_empty() {
        "task".to_string()
    } else {
        stem
    }
}
