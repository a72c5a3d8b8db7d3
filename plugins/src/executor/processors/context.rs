use async_trait::async_trait;

use subagent_core::api::{
    AgentTask, ProcessContext, ProcessMetadata, ProcessedTask, ProcessorError,
    TaskProcessorPlugin,
};

use super::files::{render_file, RenderLimits};

const END_MARKER: &str = "[END CONTEXT]";
const TASK_MARKER: &str = "[TASK]";

/// Expands a task's declarative context (files + inline data) into a prompt preamble.
///
/// Output shape:
///
/// ```text
/// [CONTEXT: 2 file(s), inline data]
/// ### File: src/lib.rs (mode: full)
/// ...
/// ### Data
/// { ... }
/// [END CONTEXT]
///
/// [TASK]
/// <original prompt>
/// ```
pub struct ContextBuilderPlugin;

impl ContextBuilderPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContextBuilderPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskProcessorPlugin for ContextBuilderPlugin {
    fn name(&self) -> &str {
        "context-builder"
    }

    fn priority(&self) -> i32 {
        20
    }

    async fn process(
        &self,
        task: &AgentTask,
        context: &ProcessContext,
    ) -> Result<ProcessedTask, ProcessorError> {
        let Some(task_ctx) = task.context.as_ref().filter(|c| !c.is_empty()) else {
            return Ok(ProcessedTask::unchanged(task));
        };

        let cfg = &context.app_config.context;
        let limits = RenderLimits::from(cfg);

        let mut body = String::new();
        let mut metadata = ProcessMetadata::default();
        for file in &task_ctx.files {
            let rendered = render_file(file, &context.workspace, &limits).await;
            body.push_str(&rendered.section);
            if let Some(info) = rendered.read {
                metadata.files.push(info);
            }
        }

        let data = task_ctx.data.as_ref().filter(|d| !d.is_empty());
        if let Some(data) = data {
            let pretty = serde_json::to_string_pretty(data)
                .map_err(|e| ProcessorError::InvalidInput(format!("context data: {}", e)))?;
            body.push_str("### Data\n");
            body.push_str(&pretty);
            body.push('\n');
        }

        let header = context_header(task_ctx.files.len(), data.is_some());
        let footer = format!("{}\n\n{}\n{}", END_MARKER, TASK_MARKER, task.prompt);
        let fixed_chars = header.chars().count() + footer.chars().count();
        let body = fit_body(body, fixed_chars, cfg.max_prompt_chars);

        tracing::debug!(
            task_id = %task.id,
            files_read = metadata.files.len(),
            body_chars = body.chars().count(),
            "context assembled"
        );

        Ok(ProcessedTask {
            original: task.clone(),
            enhanced_content: format!("{}{}{}", header, body, footer),
            metadata,
        })
    }
}

fn context_header(files: usize, has_data: bool) -> String {
    let mut parts = Vec::new();
    if files > 0 {
        parts.push(format!("{} file(s)", files));
    }
    if has_data {
        parts.push("inline data".to_string());
    }
    format!("[CONTEXT: {}]\n", parts.join(", "))
}

/// Cut `body` so that `fixed_chars + body` stays within `max_chars`, leaving a marker.
fn fit_body(body: String, fixed_chars: usize, max_chars: usize) -> String {
    let body_chars = body.chars().count();
    if fixed_chars + body_chars <= max_chars {
        return body;
    }

    // Room for the marker itself; its digits never exceed this.
    const MARKER_RESERVE: usize = 64;
    let keep = max_chars.saturating_sub(fixed_chars + MARKER_RESERVE);
    let cut = body
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    let omitted = body_chars - keep.min(body_chars);

    tracing::warn!(omitted, max_chars, "context truncated to fit prompt limit");
    let mut out = body[..cut].to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "[... context truncated: {} characters omitted ...]\n",
        omitted
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use subagent_core::api::{AppConfig, FileMode, FileRef, TaskContext};

    fn ctx(dir: &std::path::Path, cfg: AppConfig) -> ProcessContext {
        ProcessContext {
            run_id: "run".to_string(),
            workspace: dir.to_path_buf(),
            app_config: Arc::new(cfg),
        }
    }

    #[tokio::test]
    async fn task_without_context_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let task = AgentTask::new("t", "just do it");
        let out = ContextBuilderPlugin::new()
            .process(&task, &ctx(dir.path(), AppConfig::default()))
            .await
            .unwrap();
        assert_eq!(out.enhanced_content, "just do it");
        assert!(out.metadata.files.is_empty());
    }

    #[tokio::test]
    async fn files_and_data_are_wrapped_in_markers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.md"), "remember the milk\n").unwrap();

        let mut data = serde_json::Map::new();
        data.insert("ticket".to_string(), serde_json::json!("ABC-1"));
        let task = AgentTask::new("t", "summarize").with_context(TaskContext {
            files: vec![
                FileRef::new("notes.md", FileMode::Full),
                FileRef::new("gone.md", FileMode::Full),
            ],
            data: Some(data),
        });

        let out = ContextBuilderPlugin::new()
            .process(&task, &ctx(dir.path(), AppConfig::default()))
            .await
            .unwrap();

        let prompt = &out.enhanced_content;
        assert!(prompt.starts_with("[CONTEXT: 2 file(s), inline data]\n"));
        assert!(prompt.contains("### File: notes.md (mode: full)\nremember the milk\n"));
        assert!(prompt.contains("[error: cannot read gone.md"));
        assert!(prompt.contains("### Data\n{\n  \"ticket\": \"ABC-1\"\n}\n"));
        assert!(prompt.ends_with("[END CONTEXT]\n\n[TASK]\nsummarize"));

        let read: Vec<&str> = out.metadata.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(read, vec!["notes.md"]);
    }

    #[tokio::test]
    async fn oversized_context_is_truncated_under_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(5_000)).unwrap();

        let mut cfg = AppConfig::default();
        cfg.context.max_prompt_chars = 1_000;
        let task = AgentTask::new("t", "do the thing").with_context(TaskContext {
            files: vec![FileRef::new("big.txt", FileMode::Full)],
            data: None,
        });

        let out = ContextBuilderPlugin::new()
            .process(&task, &ctx(dir.path(), cfg))
            .await
            .unwrap();

        let prompt = &out.enhanced_content;
        assert!(prompt.chars().count() <= 1_000, "{}", prompt.chars().count());
        assert!(prompt.contains("[... context truncated: "));
        assert!(prompt.ends_with("[TASK]\ndo the thing"));
        assert!(!prompt.starts_with('-'));
    }

    #[test]
    fn fit_body_reports_omitted_count() {
        let body = "abcdefghij".repeat(20);
        let out = fit_body(body, 0, 100);
        assert_eq!(
            out,
            "abcdefghijabcdefghijabcdefghijabcdef\n\
             [... context truncated: 164 characters omitted ...]\n"
        );
    }
}
