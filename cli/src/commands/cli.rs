use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "subagent", version, about = "Run tasks in parallel across command-line AI agents")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of ~/.subagent/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one batch of tasks and print the batch result as JSON.
    Run(RunArgs),
    /// List the registered backends.
    Backends,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// JSON task list: a file path, or `-` for stdin.
    #[arg(long, default_value = "-")]
    pub tasks: String,

    /// Backend for tasks that do not name one.
    #[arg(long)]
    pub backend: Option<String>,

    /// Timeout in seconds for tasks that do not set `timeout_seconds`.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Working directory for tasks that do not set `workspace`.
    #[arg(long)]
    pub workspace: Option<String>,

    /// Pretty-print the result JSON.
    #[arg(long)]
    pub pretty: bool,
}
