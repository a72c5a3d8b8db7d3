use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::audit::{start_audit, AuditTx};
use crate::config::AppConfig;
use crate::error::RunnerError;

/// Process-wide state shared by every batch: configuration and the audit sink.
#[derive(Clone)]
pub struct AppContext {
    cfg: Arc<AppConfig>,
    audit: Option<AuditTx>,
    audit_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppContext {
    pub async fn new(cfg: AppConfig) -> Result<Self, RunnerError> {
        let (audit, audit_task) = match start_audit(&cfg.audit).await.map_err(RunnerError::Config)? {
            Some((tx, handle)) => (Some(tx), Some(handle)),
            None => (None, None),
        };
        Ok(Self {
            cfg: Arc::new(cfg),
            audit,
            audit_task: Arc::new(Mutex::new(audit_task)),
        })
    }

    /// Context without an audit sink.
    pub fn without_audit(cfg: AppConfig) -> Self {
        Self {
            cfg: Arc::new(cfg),
            audit: None,
            audit_task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn cfg_arc(&self) -> Arc<AppConfig> {
        self.cfg.clone()
    }

    pub fn audit(&self) -> Option<AuditTx> {
        self.audit.clone()
    }

    /// Close this handle's audit sender and wait (bounded) for the writer to flush.
    /// Every other clone of the sender must already be dropped for the writer to finish.
    pub async fn shutdown(mut self, timeout: Duration) {
        self.audit = None;
        let handle = self.audit_task.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                tracing::warn!("audit writer did not finish before shutdown timeout");
            }
        }
    }
}
