use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to start one child process.
#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub envs: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

/// Terminal state of one process invocation. Exactly one is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The process exited before the deadline (code -1 when killed by a signal).
    Exited(i32),
    /// The deadline fired first; later output or exit is ignored.
    TimedOut,
    /// The process could not be started, or could not be waited on.
    SpawnFailed(String),
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}
