use thiserror::Error;

/// Errors raised by task processors.
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
