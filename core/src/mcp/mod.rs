//! Auxiliary tool-server ("MCP server") plumbing shared by all backends.
//!
//! The shared config document is generic and backend-agnostic. Backends transform a filtered
//! copy of it into their own format, which is written to a per-attempt ephemeral file.

mod document;
mod ephemeral;
mod timeouts;

pub use document::McpServersDocument;
pub use ephemeral::{default_ephemeral_dir, EphemeralConfig};
pub use timeouts::{
    recommended_timeout_secs, resolve_timeout, DEFAULT_SERVER_TIMEOUT_SECS, FALLBACK_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS,
};
