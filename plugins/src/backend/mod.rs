pub mod claude;
pub mod copilot;

pub use claude::ClaudeBackendStrategy;
pub use copilot::CopilotBackendStrategy;
