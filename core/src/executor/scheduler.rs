use std::future::Future;

use super::types::{AgentTask, TaskResult};

/// Run every task concurrently and collect results in submission order.
///
/// Each task gets its own tokio task; a panic inside one becomes a failed result in its slot
/// instead of tearing down the batch.
pub async fn execute_all<F, Fut>(tasks: Vec<AgentTask>, executor_fn: F) -> Vec<TaskResult>
where
    F: Fn(AgentTask) -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    let handles: Vec<(String, tokio::task::JoinHandle<TaskResult>)> = tasks
        .into_iter()
        .map(|task| {
            let id = task.id.clone();
            (id, tokio::spawn(executor_fn(task)))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "task aborted unexpectedly");
                TaskResult::failed(&id, format!("Task '{}' aborted: {}", id, e), 0)
            }
        };
        results.push(result);
    }
    results
}
