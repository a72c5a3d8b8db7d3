use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncReadExt;

use subagent_core::api::{
    active_task_ids, wait_for_drain, AgentTask, AppContext, BatchResult, CliError, ExecutionOpts,
};
use subagent_plugins::factory;

use super::cli::RunArgs;

/// Exit code when a shutdown signal interrupts the batch.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Accepted input shapes: a bare array, or `{"tasks": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskInput {
    List(Vec<AgentTask>),
    Wrapped { tasks: Vec<AgentTask> },
}

pub async fn handle_run(args: RunArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let raw = read_input(&args.tasks).await?;
    let tasks = parse_tasks(&raw, args.backend.as_deref())?;
    let opts = execution_opts(&args, ctx);
    let engine = factory::build_engine(ctx);
    let drain = Duration::from_millis(ctx.cfg().executor.shutdown_drain_ms);

    tracing::info!(
        tasks = tasks.len(),
        timeout_secs = opts.default_timeout_secs,
        workspace = %opts.default_workspace.display(),
        "starting batch"
    );

    let batch = tokio::select! {
        res = engine.run_batch(tasks, &opts) => res?,
        signal = shutdown_signal() => {
            tracing::warn!(
                signal,
                in_flight = active_task_ids().len(),
                drain_ms = drain.as_millis() as u64,
                "shutdown requested, waiting for running tasks"
            );
            if !wait_for_drain(drain).await {
                let mut remaining: Vec<String> = active_task_ids().into_iter().collect();
                remaining.sort();
                tracing::warn!(?remaining, "drain timed out");
            }
            return Ok(EXIT_INTERRUPTED);
        }
    };

    write_result(&batch, args.pretty)?;
    Ok(if batch.failed == 0 { 0 } else { 1 })
}

async fn read_input(source: &str) -> Result<String, CliError> {
    if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| CliError::Input(format!("read tasks file {}: {}", source, e)))
    }
}

/// Parse the task list; `default_backend` fills tasks that do not name one.
pub fn parse_tasks(raw: &str, default_backend: Option<&str>) -> Result<Vec<AgentTask>, CliError> {
    if raw.trim().is_empty() {
        return Err(CliError::Input("no task list provided".to_string()));
    }
    let input: TaskInput = serde_json::from_str(raw)
        .map_err(|e| CliError::Input(format!("parse task list: {}", e)))?;
    let mut tasks = match input {
        TaskInput::List(tasks) => tasks,
        TaskInput::Wrapped { tasks } => tasks,
    };

    if let Some(backend) = default_backend.map(str::trim).filter(|b| !b.is_empty()) {
        for task in tasks.iter_mut().filter(|t| t.backend.is_none()) {
            task.backend = Some(backend.to_string());
        }
    }
    Ok(tasks)
}

fn execution_opts(args: &RunArgs, ctx: &AppContext) -> ExecutionOpts {
    let mut opts = ExecutionOpts::from_config(&ctx.cfg().executor);
    if let Some(secs) = args.timeout.filter(|s| s.is_finite() && *s > 0.0) {
        opts.default_timeout_secs = secs;
    }
    if let Some(ws) = args.workspace.as_deref().filter(|w| !w.trim().is_empty()) {
        opts.default_workspace = ws.into();
    }
    opts
}

fn write_result(batch: &BatchResult, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(batch)
    } else {
        serde_json::to_string(batch)
    }
    .map_err(|e| CliError::Anyhow(e.into()))?;
    println!("{}", json);
    Ok(())
}

async fn shutdown_signal() -> &'static str {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = wait_for_sigterm() => "SIGTERM",
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
