//! One child process from spawn to a terminal [`ProcessStatus`].
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::CaptureBuffer;

use super::abort;
use super::io_pump;
use super::types::{ProcessOutcome, ProcessStatus, RunnerStartArgs};

/// Spawn `args`, collect stdout/stderr, and race process exit against `timeout`.
///
/// Whichever of exit and deadline completes first decides the status; the loser is ignored.
/// On timeout the child is handed to a background reaper (SIGTERM, then SIGKILL after
/// `kill_grace`) and this function returns right away.
pub async fn run_process(
    args: &RunnerStartArgs,
    timeout: Duration,
    kill_grace: Duration,
    task_id: &str,
) -> ProcessOutcome {
    let started_at = Instant::now();
    let deadline = tokio::time::Instant::from_std(started_at) + timeout;

    let mut cmd = Command::new(&args.cmd);
    cmd.args(&args.args)
        .envs(&args.envs)
        // Agent CLIs run non-interactively; some block until stdin reaches EOF.
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &args.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let msg = format!("Failed to spawn process '{}': {}", args.cmd, e);
            tracing::warn!(task_id = %task_id, error = %msg, "spawn failed");
            return ProcessOutcome {
                status: ProcessStatus::SpawnFailed(msg),
                stdout: String::new(),
                stderr: String::new(),
                elapsed: started_at.elapsed(),
            };
        }
    };

    tracing::debug!(task_id = %task_id, pid = ?child.id(), cmd = %args.cmd, "child spawned");

    let out_buf = CaptureBuffer::new();
    let err_buf = CaptureBuffer::new();
    let mut pumps: Vec<JoinHandle<Result<u64, RunnerError>>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(io_pump::pump_stdout(stdout, out_buf.clone(), task_id.to_string()));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(io_pump::pump_stderr(stderr, err_buf.clone(), task_id.to_string()));
    }

    let waited = tokio::select! {
        res = child.wait() => Some(res),
        _ = tokio::time::sleep_until(deadline) => None,
    };

    let status = match waited {
        None => {
            tracing::warn!(
                task_id = %task_id,
                timeout_ms = timeout.as_millis() as u64,
                "deadline reached, terminating child"
            );
            for pump in &pumps {
                pump.abort();
            }
            abort::spawn_reaper(child, kill_grace, task_id.to_string());
            ProcessStatus::TimedOut
        }
        Some(Ok(exit)) => {
            // A grandchild may keep the pipes open after the child exits; stop reading at the
            // deadline rather than waiting on it.
            let drained =
                tokio::time::timeout_at(deadline, futures::future::join_all(pumps.iter_mut()))
                    .await;
            match drained {
                Ok(results) => {
                    for res in results {
                        match res {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => tracing::warn!(task_id = %task_id, error = %e, "stream pump failed"),
                            Err(e) => tracing::warn!(task_id = %task_id, error = %e, "stream pump join failed"),
                        }
                    }
                }
                Err(_) => {
                    tracing::warn!(task_id = %task_id, "output pipes still open after exit, keeping partial output");
                    for pump in &pumps {
                        pump.abort();
                    }
                }
            }
            ProcessStatus::Exited(exit.code().unwrap_or(-1))
        }
        Some(Err(e)) => {
            for pump in &pumps {
                pump.abort();
            }
            ProcessStatus::SpawnFailed(format!(
                "Process spawn failure for '{}': wait failed: {}",
                args.cmd, e
            ))
        }
    };

    ProcessOutcome {
        status,
        stdout: out_buf.to_string_lossy(),
        stderr: err_buf.to_string_lossy(),
        elapsed: started_at.elapsed(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sh(script: &str) -> RunnerStartArgs {
        RunnerStartArgs {
            cmd: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            envs: HashMap::new(),
            cwd: None,
        }
    }

    #[tokio::test]
    async fn collects_stdout_and_stderr_on_exit() {
        let outcome = run_process(
            &sh("echo done; echo warn >&2; exit 3"),
            Duration::from_secs(10),
            Duration::from_millis(100),
            "t1",
        )
        .await;

        assert_eq!(outcome.status, ProcessStatus::Exited(3));
        assert_eq!(outcome.stdout, "done\n");
        assert_eq!(outcome.stderr, "warn\n");
    }

    #[tokio::test]
    async fn deadline_wins_over_slow_child() {
        let outcome = run_process(
            &sh("sleep 1; echo late"),
            Duration::from_millis(100),
            Duration::from_millis(100),
            "t2",
        )
        .await;

        assert_eq!(outcome.status, ProcessStatus::TimedOut);
        assert!(outcome.elapsed >= Duration::from_millis(100));
        assert!(outcome.elapsed < Duration::from_millis(900));
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_failure() {
        let args = RunnerStartArgs {
            cmd: "/nonexistent/agent-binary".to_string(),
            args: Vec::new(),
            envs: HashMap::new(),
            cwd: None,
        };
        let outcome =
            run_process(&args, Duration::from_secs(5), Duration::from_millis(100), "t3").await;

        match outcome.status {
            ProcessStatus::SpawnFailed(msg) => {
                assert!(msg.contains("Failed to spawn process '/nonexistent/agent-binary'"));
            }
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stdin_is_closed() {
        // `cat` exits immediately on EOF; with an open stdin it would hang until the deadline.
        let outcome = run_process(
            &sh("cat; echo eof"),
            Duration::from_secs(5),
            Duration::from_millis(100),
            "t4",
        )
        .await;
        assert_eq!(outcome.status, ProcessStatus::Exited(0));
        assert_eq!(outcome.stdout.trim(), "eof");
    }

    #[tokio::test]
    async fn env_and_cwd_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = sh("printf '%s:' \"$AGENT_FLAVOR\"; pwd");
        args.envs.insert("AGENT_FLAVOR".to_string(), "mint".to_string());
        args.cwd = Some(dir.path().to_path_buf());

        let outcome =
            run_process(&args, Duration::from_secs(5), Duration::from_millis(100), "t5").await;
        let canon = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(outcome.stdout.trim(), format!("mint:{}", canon.display()));
    }
}
