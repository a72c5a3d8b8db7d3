use serde::{Deserialize, Serialize};

use crate::executor::types::{AgentTask, TaskResult};
use crate::util::preview;

const PROMPT_PREVIEW_CHARS: usize = 200;
const OUTPUT_PREVIEW_CHARS: usize = 500;

/// One JSONL line per completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub run_id: String,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub prompt_preview: String,
    #[serde(default)]
    pub mcp_servers: Vec<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn from_result(run_id: &str, task: &AgentTask, result: &TaskResult) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            run_id: run_id.to_string(),
            task_id: result.id.clone(),
            backend: result.backend.clone(),
            prompt_preview: preview(&task.prompt, PROMPT_PREVIEW_CHARS),
            mcp_servers: task.mcp_servers.clone(),
            success: result.success,
            duration_ms: result.duration_ms,
            attempts: result.attempts,
            output_preview: result
                .output
                .as_deref()
                .map(|o| preview(o, OUTPUT_PREVIEW_CHARS)),
            error: result.error.clone(),
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"task_id":{:?},"error":"audit serialization failed: {}"}}"#,
                self.task_id, e
            )
        })
    }
}
