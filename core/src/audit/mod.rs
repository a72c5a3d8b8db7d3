//! Append-only JSONL record of completed tasks.
mod record;
mod writer;

pub use record::AuditRecord;
pub use writer::{start_audit, AuditTx};
