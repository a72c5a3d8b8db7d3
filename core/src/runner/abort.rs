use std::time::Duration;

use tokio::process::Child;

/// Ask the child to stop: SIGTERM on unix, then SIGKILL once `grace` has passed.
/// Elsewhere the child is killed outright.
pub async fn terminate_process(child: &mut Child, grace: Duration, task_id: &str) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: plain signal delivery to a pid we spawned and have not yet reaped.
            let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if ret != 0 {
                let err = std::io::Error::last_os_error();
                tracing::warn!(task_id = %task_id, pid, error = %err, "failed to send SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }

    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        tracing::warn!(task_id = %task_id, "grace period expired, sending SIGKILL");
        let _ = child.kill().await;
    }
}

/// Hand a timed-out child to a background task so the caller can report immediately.
pub fn spawn_reaper(mut child: Child, grace: Duration, task_id: String) {
    tokio::spawn(async move {
        terminate_process(&mut child, grace, &task_id).await;
        tracing::debug!(task_id = %task_id, "timed-out child reaped");
    });
}
