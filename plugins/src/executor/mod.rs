pub mod processors;
pub mod strategies;

pub use processors::ContextBuilderPlugin;
pub use strategies::FixedDelayRetryPlugin;
