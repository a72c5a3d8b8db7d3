use std::time::Duration;

use clap::Parser;
mod commands;
use commands::cli;
use subagent_core::api::{resolve_executable, AppConfig, AppContext, CliError, RunnerError};
use subagent_core::config::{self, LoggingConfig};
use subagent_plugins::factory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

/// Bound on flushing the audit sink at exit.
const AUDIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    match args.command {
        cli::Commands::Run(run_args) => {
            let ctx = AppContext::new(cfg).await.map_err(CliError::Runner)?;
            let result = commands::run::handle_run(run_args, &ctx).await;
            ctx.shutdown(AUDIT_FLUSH_TIMEOUT).await;
            result
        }
        cli::Commands::Backends => {
            let registry = factory::build_registry();
            for name in registry.names() {
                if let Some(backend) = registry.get(name) {
                    let exe = resolve_executable(backend.as_ref(), &cfg.backend_config(name));
                    let marker = if name == cfg.backend { " (default)" } else { "" };
                    println!("{name}\t{exe}{marker}");
                }
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    match path {
        Some(p) => {
            let mut cfg = config::load_from_path(std::path::Path::new(p))
                .map_err(|e| CliError::Config(e.to_string()))?;
            config::apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
        None => config::load_default().map_err(|e| CliError::Config(e.to_string())),
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: every task succeeded
    // 1: batch ran, at least one task failed (returned as a normal exit code)
    // 11: config error
    // 12: invalid input / rejected batch
    // 20: IO error
    // 50: internal/uncategorized
    // 130: interrupted by a shutdown signal (normal exit code)
    match e {
        CliError::Config(_) => 11,
        CliError::Input(_) | CliError::Executor(_) => 12,
        CliError::Runner(re) => match re {
            RunnerError::Config(_) => 11,
            RunnerError::StreamIo { .. } => 20,
        },
        CliError::Io(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("subagent"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("subagent.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    // stdout carries the batch result; console logs always go to stderr.
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok(())
}
