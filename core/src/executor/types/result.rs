use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Outcome of one task. Build through [`TaskResult::succeeded`] or [`TaskResult::failed`] so
/// that exactly one of `output` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    /// Wall time of the final attempt, from its start (ephemeral config write, then spawn) to
    /// exit or timeout. Context assembly and retry delays are not included; `attempts` says how
    /// many ran.
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Auxiliary servers the task asked for.
    #[serde(default)]
    pub mcp_servers: Vec<String>,
    /// Context files that were actually read.
    #[serde(default)]
    pub context_files: Vec<String>,
    pub attempts: u32,
}

impl TaskResult {
    pub fn succeeded(
        id: impl Into<String>,
        output: impl Into<String>,
        tokens: Option<TokenUsage>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            tokens,
            duration_ms,
            backend: None,
            mcp_servers: Vec::new(),
            context_files: Vec::new(),
            attempts: 1,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            success: false,
            output: None,
            error: Some(error.into()),
            tokens: None,
            duration_ms,
            backend: None,
            mcp_servers: Vec::new(),
            context_files: Vec::new(),
            attempts: 1,
        }
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}

/// Aggregate over one submitted task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Same order as the submitted tasks.
    pub results: Vec<TaskResult>,
    pub duration_ms: u64,
}

impl BatchResult {
    pub fn from_results(results: Vec<TaskResult>, duration_ms: u64) -> Self {
        let completed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            completed,
            failed: results.len() - completed,
            results,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_up() {
        let batch = BatchResult::from_results(
            vec![
                TaskResult::succeeded("a", "done", None, 12),
                TaskResult::failed("b", "boom", 3),
                TaskResult::failed("c", "boom", 4),
            ],
            20,
        );
        assert_eq!(batch.total, 3);
        assert_eq!(batch.completed, 1);
        assert_eq!(batch.failed, 2);
    }

    #[test]
    fn failure_serializes_without_output() {
        let value = serde_json::to_value(TaskResult::failed("b", "boom", 3)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert!(value.get("output").is_none());
    }
}
