use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::AuditConfig;
use crate::util::preview;

const STDOUT_SINK: &str = "stdout:";
const STDERR_SINK: &str = "stderr:";

/// Cloneable sender half of the audit sink.
#[derive(Clone)]
pub struct AuditTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl AuditTx {
    pub async fn send_line(&self, line: String) {
        if self.drop_when_full {
            if self.tx.try_send(line).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        } else if self.tx.send(line).await.is_err() {
            // writer closed
        }
    }
}

/// Start the background writer. Returns `None` when auditing is disabled.
///
/// `path` is a JSONL file opened in append mode, or `stderr:`. `stdout:` is rejected: stdout
/// carries the batch result.
pub async fn start_audit(
    cfg: &AuditConfig,
) -> Result<Option<(AuditTx, JoinHandle<()>)>, String> {
    if !cfg.enabled || cfg.path.trim().is_empty() {
        return Ok(None);
    }

    let path = cfg.path.trim().to_string();
    if path == STDOUT_SINK {
        return Err(format!(
            "audit.path '{}' is not supported: stdout is reserved for the batch result; use '{}' or a file path",
            STDOUT_SINK, STDERR_SINK
        ));
    }
    let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = if path == STDERR_SINK {
        Box::new(tokio::io::stderr())
    } else {
        if let Some(parent) = std::path::Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("create audit dir {}: {}", parent.display(), e))?;
            }
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| format!("open audit log {}: {}", path, e))?;
        Box::new(file)
    };

    let (tx, mut rx) = mpsc::channel::<String>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = dropped.clone();

    let handle = tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            if !line.ends_with('\n') {
                line.push('\n');
            }
            if path == STDERR_SINK {
                tracing::debug!(
                    target: "subagent.stderr_audit",
                    bytes = line.len(),
                    preview = %preview(line.trim_end(), 120)
                );
            }
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                tracing::warn!(error = %e, "audit write failed, closing sink");
                return;
            }
            let _ = writer.flush().await;
        }

        let _ = writer.flush().await;
        let dropped = dropped_clone.load(Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(dropped, "audit records dropped because the channel was full");
        }
    });

    Ok(Some((
        AuditTx {
            tx,
            dropped,
            drop_when_full: cfg.drop_when_full,
        },
        handle,
    )))
}
