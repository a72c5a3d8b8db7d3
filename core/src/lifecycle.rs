//! Process-wide set of in-flight task ids, used to drain gracefully on shutdown.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lazy_static::lazy_static;

lazy_static! {
    static ref ACTIVE_TASKS: Arc<ActiveTaskSet> = Arc::new(ActiveTaskSet::new());
}

/// Shared handle to the process-wide set.
pub fn active_tasks() -> Arc<ActiveTaskSet> {
    ACTIVE_TASKS.clone()
}

/// Snapshot of the ids currently running in this process.
pub fn active_task_ids() -> HashSet<String> {
    ACTIVE_TASKS.snapshot()
}

/// Wait until no task is in flight or `timeout` passes. Returns true when drained.
pub async fn wait_for_drain(timeout: Duration) -> bool {
    ACTIVE_TASKS.wait_for_drain(timeout).await
}

#[derive(Debug, Default)]
pub struct ActiveTaskSet {
    inner: Mutex<HashSet<String>>,
}

impl ActiveTaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: &str) {
        if let Ok(mut set) = self.inner.lock() {
            set.insert(id.to_string());
        }
    }

    pub fn remove(&self, id: &str) {
        if let Ok(mut set) = self.inner.lock() {
            set.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .lock()
            .map(|set| set.contains(id))
            .unwrap_or(false)
    }

    /// Copy of the current members; never hands out the live set.
    pub fn snapshot(&self) -> HashSet<String> {
        self.inner.lock().map(|set| set.clone()).unwrap_or_default()
    }

    /// Register `id` until the returned guard is dropped.
    pub fn track(self: &Arc<Self>, id: &str) -> ActiveTaskGuard {
        self.add(id);
        ActiveTaskGuard {
            set: Arc::clone(self),
            id: id.to_string(),
        }
    }

    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let poll = Duration::from_millis(100);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = self.len();
            if remaining == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    remaining,
                    ids = ?self.snapshot(),
                    "shutdown drain timed out with tasks still running"
                );
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }
}

/// Removes its id from the set on drop, including on early returns and panics.
#[derive(Debug)]
pub struct ActiveTaskGuard {
    set: Arc<ActiveTaskSet>,
    id: String,
}

impl Drop for ActiveTaskGuard {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}
