pub mod retry;

pub use retry::FixedDelayRetryPlugin;
