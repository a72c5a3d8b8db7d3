//! Child process execution: spawn, capture, deadline, terminate.
mod abort;
mod attempt;
mod io_pump;
mod run;
pub mod types;

pub use abort::terminate_process;
pub use attempt::{AttemptInput, AttemptRunner};
pub use run::run_process;
pub use types::{ProcessOutcome, ProcessStatus, RunnerStartArgs};
