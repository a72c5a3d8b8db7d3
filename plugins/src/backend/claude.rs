use serde_json::Value;

use subagent_core::api as core_api;
use subagent_core::api::{BackendOptions, McpServersDocument, ParsedOutput, TokenUsage};

pub struct ClaudeBackendStrategy;

impl core_api::BackendStrategy for ClaudeBackendStrategy {
    fn name(&self) -> &str {
        "claude"
    }

    fn default_executable(&self) -> &str {
        "claude"
    }

    fn build_args(&self, prompt: &str, options: &BackendOptions) -> Vec<String> {
        // Non-interactive, single JSON object on stdout.
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--output-format".to_string(),
            "json".to_string(),
        ];

        if let Some(path) = &options.mcp_config_path {
            args.push("--mcp-config".to_string());
            args.push(path.display().to_string());
        }
        if options.allow_all_tools {
            args.push("--dangerously-skip-permissions".to_string());
        }
        if let Some(turns) = options.max_turns {
            args.push("--max-turns".to_string());
            args.push(turns.to_string());
        }
        if let Some(m) = &options.model {
            args.push("--model".to_string());
            args.push(m.clone());
        }
        args
    }

    fn parse_output(&self, stdout: &str, _stderr: &str, exit_code: i32) -> ParsedOutput {
        match parse_result_json(stdout) {
            Some(parsed) => parsed,
            None => {
                if !stdout.trim().is_empty() {
                    tracing::debug!(exit_code, "claude output is not json, using raw text");
                }
                ParsedOutput::text(stdout.trim())
            }
        }
    }

    /// Claude rejects copilot-style server entries: drop `tools` and a `"local"` type.
    fn prepare_mcp_config(&self, doc: &McpServersDocument) -> Value {
        let mut cleaned = doc.clone();
        for entry in cleaned.servers.values_mut() {
            if let Some(obj) = entry.as_object_mut() {
                obj.remove("tools");
                if obj.get("type").and_then(Value::as_str) == Some("local") {
                    obj.remove("type");
                }
            }
        }
        cleaned.to_value()
    }
}

/// The whole stdout as one JSON object, or else its last line that is one.
fn parse_result_json(stdout: &str) -> Option<ParsedOutput> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = serde_json::from_str::<Value>(trimmed).ok().or_else(|| {
        trimmed
            .lines()
            .rev()
            .map(str::trim)
            .filter(|l| l.starts_with('{'))
            .find_map(|l| serde_json::from_str::<Value>(l).ok())
    })?;

    let output = value.get("result")?.as_str()?.to_string();
    let tokens = value.get("usage").and_then(|usage| {
        Some(TokenUsage {
            input_tokens: usage.get("input_tokens")?.as_u64()?,
            output_tokens: usage.get("output_tokens")?.as_u64()?,
        })
    });
    Some(ParsedOutput { output, tokens })
}
