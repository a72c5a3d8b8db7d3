use std::future::Future;

use super::traits::RetryStrategyPlugin;
use super::types::TaskResult;

/// Run `attempt_fn` until it succeeds or the strategy declines another try.
///
/// The returned result is the last attempt's, with `attempts` set to the number of spawns.
/// Without a strategy there is exactly one attempt.
pub async fn run_with_retry<F, Fut>(
    task_id: &str,
    strategy: Option<&dyn RetryStrategyPlugin>,
    mut attempt_fn: F,
) -> TaskResult
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = TaskResult>,
{
    let mut attempt: u32 = 1;
    let mut current = attempt_fn(attempt).await;

    if let Some(strategy) = strategy {
        while !current.success {
            let err = current.error_text().to_string();
            if !strategy.should_retry(attempt, &err) {
                break;
            }
            let Some(delay) = strategy.next_delay(attempt, &err) else {
                break;
            };

            tracing::warn!(
                task_id = %task_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                strategy = %strategy.name(),
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            current = attempt_fn(attempt).await;
        }
    }

    current.attempts = attempt;
    current
}
