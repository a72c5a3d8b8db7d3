#![cfg(unix)]

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use subagent_core::api::{AgentTask, AppContext, ExecutionOpts, ExecutorError};

use common::{engine_for, harness, opts, test_config};

#[tokio::test]
async fn mixed_batch_reports_success_and_spawn_failure() {
    let h = harness(test_config(), true);
    let tasks = vec![
        AgentTask::new("a", "echo done"),
        AgentTask::new("b", "anything").with_backend("missing"),
    ];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();

    assert_eq!(batch.total, 2);
    assert_eq!(batch.completed, 1);
    assert_eq!(batch.failed, 1);

    let a = &batch.results[0];
    assert_eq!(a.id, "a");
    assert!(a.success);
    assert_eq!(a.output.as_deref(), Some("done"));
    assert_eq!(a.backend.as_deref(), Some("shell"));

    let b = &batch.results[1];
    assert_eq!(b.id, "b");
    assert!(!b.success);
    assert!(b.error_text().to_lowercase().contains("spawn"));
    assert!(b.output.is_none());
    // Spawn failures are transient.
    assert_eq!(b.attempts, 2);
}

#[tokio::test]
async fn short_timeout_beats_slow_process() {
    let h = harness(test_config(), false);
    let tasks = vec![AgentTask::new("slow", "sleep 1").with_timeout_seconds(0.1)];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();
    let r = &batch.results[0];

    assert!(!r.success);
    assert!(r.error_text().contains("Timeout"), "{}", r.error_text());
    assert!(r.duration_ms >= 100, "{}", r.duration_ms);
    assert!(r.duration_ms < 1000, "{}", r.duration_ms);
}

#[tokio::test]
async fn timed_out_task_is_retried_and_reports_final_attempt() {
    let h = harness(test_config(), true);
    let tasks = vec![AgentTask::new("slow", "sleep 1").with_timeout_seconds(0.1)];

    let started = std::time::Instant::now();
    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();
    let r = &batch.results[0];

    assert!(!r.success);
    assert_eq!(r.attempts, 2);
    assert!(r.error_text().starts_with("Timeout"), "{}", r.error_text());
    // duration_ms covers the final attempt only.
    assert!(r.duration_ms >= 100, "{}", r.duration_ms);
    assert!(r.duration_ms < 190, "{}", r.duration_ms);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn oversized_task_timeout_still_runs_and_echoes_fields() {
    let h = harness(test_config(), false);
    let tasks = vec![AgentTask::new("big", "echo done")
        .with_timeout_seconds(1e20)
        .with_mcp_servers(["fetch"])];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();
    let r = &batch.results[0];

    assert!(r.success, "{}", r.error_text());
    assert_eq!(r.output.as_deref(), Some("done"));
    assert_eq!(r.backend.as_deref(), Some("shell"));
    assert_eq!(r.mcp_servers, vec!["fetch".to_string()]);
}

#[tokio::test]
async fn unusable_batch_default_timeout_falls_back() {
    let h = harness(test_config(), false);
    for default in [-1.0, f64::NAN, f64::INFINITY] {
        let opts = ExecutionOpts::new(default, std::env::temp_dir());
        let batch = h
            .engine
            .run_batch(vec![AgentTask::new("t", "echo done")], &opts)
            .await
            .unwrap();
        let r = &batch.results[0];
        assert!(r.success, "default {default}: {}", r.error_text());
        assert_eq!(r.backend.as_deref(), Some("shell"));
    }
}

#[tokio::test]
async fn only_transient_errors_are_retried() {
    let h = harness(test_config(), true);
    let tasks = vec![
        AgentTask::new("flaky", "echo 'read ECONNRESET' >&2; exit 1"),
        AgentTask::new("broken", "echo 'invalid prompt' >&2; exit 1"),
    ];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();

    assert_eq!(batch.results[0].attempts, 2);
    assert_eq!(batch.results[0].error_text(), "read ECONNRESET");
    assert_eq!(batch.results[1].attempts, 1);
    assert_eq!(batch.results[1].error_text(), "invalid prompt");
}

#[tokio::test]
async fn duplicate_ids_are_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let script = format!("touch {}", marker.display());

    let h = harness(test_config(), false);
    let tasks = vec![
        AgentTask::new("x", script.clone()),
        AgentTask::new("x", script),
    ];

    let err = h.engine.run_batch(tasks, &opts()).await.unwrap_err();
    assert_eq!(err, ExecutorError::DuplicateTaskId("x".to_string()));
    assert_eq!(err.to_string(), "Duplicate task ID: x");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn results_follow_submission_order() {
    let h = harness(test_config(), false);
    let tasks = vec![
        AgentTask::new("first", "sleep 0.3; echo 1"),
        AgentTask::new("second", "exit 4"),
        AgentTask::new("third", "echo 3"),
    ];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();

    let ids: Vec<&str> = batch.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
    assert_eq!(batch.completed + batch.failed, batch.total);
    assert_eq!(batch.results[1].error_text(), "Process exited with code 4");
    for r in &batch.results {
        assert_eq!(r.success, r.output.is_some());
        assert_eq!(r.success, r.error.is_none());
    }
}

#[tokio::test]
async fn active_set_tracks_in_flight_tasks() {
    let h = harness(test_config(), false);
    let engine = std::sync::Arc::new(h.engine);
    let active = h.active.clone();

    let runner = engine.clone();
    let handle = tokio::spawn(async move {
        let tasks = vec![
            AgentTask::new("p", "sleep 0.4"),
            AgentTask::new("q", "sleep 0.4"),
        ];
        runner.run_batch(tasks, &opts()).await
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(active.contains("p"));
    assert!(active.contains("q"));

    handle.await.unwrap().unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn unknown_backend_fails_only_that_task() {
    let h = harness(test_config(), true);
    let tasks = vec![
        AgentTask::new("ok", "echo fine"),
        AgentTask::new("bad", "echo never").with_backend("nope"),
    ];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();

    assert!(batch.results[0].success);
    let bad = &batch.results[1];
    assert!(!bad.success);
    assert_eq!(
        bad.error_text(),
        "Unknown backend 'nope'. Available backends: missing, shell"
    );
    assert_eq!(bad.attempts, 1);
    assert!(h.active.is_empty());
}

#[tokio::test]
async fn task_workspace_sets_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(test_config(), false);
    let tasks = vec![AgentTask::new("where", "pwd").with_workspace(dir.path().to_string_lossy())];

    let batch = h.engine.run_batch(tasks, &opts()).await.unwrap();
    let canon = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(
        batch.results[0].output.as_deref(),
        Some(canon.to_string_lossy().as_ref())
    );
}

#[tokio::test]
async fn completed_tasks_are_audited() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let mut cfg = test_config();
    cfg.audit.enabled = true;
    cfg.audit.drop_when_full = false;
    cfg.audit.path = audit_path.to_string_lossy().to_string();

    let ctx = AppContext::new(cfg).await.unwrap();
    let h = engine_for(&ctx, false);
    let tasks = vec![
        AgentTask::new("one", "echo hello"),
        AgentTask::new("two", "exit 1"),
    ];
    h.engine.run_batch(tasks, &opts()).await.unwrap();
    drop(h);
    ctx.shutdown(Duration::from_secs(2)).await;

    let body = std::fs::read_to_string(&audit_path).unwrap();
    let mut records: Vec<serde_json::Value> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    records.sort_by(|a, b| a["task_id"].as_str().cmp(&b["task_id"].as_str()));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["task_id"], "one");
    assert_eq!(records[0]["success"], true);
    assert_eq!(records[0]["output_preview"], "hello");
    assert_eq!(records[1]["task_id"], "two");
    assert_eq!(records[1]["error"], "Process exited with code 1");
}
