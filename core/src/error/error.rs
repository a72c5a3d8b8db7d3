use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("executor error: {0}")]
    Executor(#[from] super::ExecutorError),
    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
}
