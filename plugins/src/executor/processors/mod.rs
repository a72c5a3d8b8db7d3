pub mod context;
pub mod files;

pub use context::ContextBuilderPlugin;
