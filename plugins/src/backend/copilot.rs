use lazy_static::lazy_static;
use regex::Regex;

use subagent_core::api as core_api;
use subagent_core::api::{BackendOptions, ParsedOutput, TokenUsage};

lazy_static! {
    // e.g. "Total usage est: 1 Premium request ... 12345 in, 678 out"
    static ref TOKEN_USAGE: Regex =
        Regex::new(r"(\d[\d,]*)\s+in,\s+(\d[\d,]*)\s+out").expect("token usage regex is valid");
}

/// Servers whose tools copilot may silently fail to expose; the prompt gets a workaround.
const BROWSER_SERVERS: &[&str] = &["playwright", "puppeteer"];

pub struct CopilotBackendStrategy;

impl core_api::BackendStrategy for CopilotBackendStrategy {
    fn name(&self) -> &str {
        "copilot"
    }

    fn default_executable(&self) -> &str {
        "copilot"
    }

    fn build_args(&self, prompt: &str, options: &BackendOptions) -> Vec<String> {
        let mut args = vec!["-p".to_string(), prompt.to_string()];

        // Both permission flags are opt-in and independent.
        if options.allow_all_tools {
            args.push("--allow-all-tools".to_string());
        }
        if options.allow_all_paths {
            args.push("--allow-all-paths".to_string());
        }
        if let Some(m) = &options.model {
            args.push("--model".to_string());
            args.push(m.clone());
        }
        // Merged on top of the user's own copilot mcp config, which we do not control.
        if let Some(path) = &options.mcp_config_path {
            args.push("--additional-mcp-config".to_string());
            args.push(format!("@{}", path.display()));
        }
        args
    }

    fn parse_output(&self, stdout: &str, stderr: &str, _exit_code: i32) -> ParsedOutput {
        ParsedOutput {
            output: stdout.trim().to_string(),
            tokens: scan_token_usage(stdout).or_else(|| scan_token_usage(stderr)),
        }
    }

    fn augment_prompt_for_mcp(&self, prompt: &str, servers: &[String]) -> String {
        let browser: Vec<&str> = servers
            .iter()
            .map(String::as_str)
            .filter(|s| BROWSER_SERVERS.contains(&s.to_lowercase().as_str()))
            .collect();
        if browser.is_empty() {
            return prompt.to_string();
        }

        tracing::debug!(servers = ?browser, "appending browser automation fallback to prompt");
        format!(
            "{prompt}\n\n[MCP FALLBACK]\n\
             The tool server(s) {servers} may not be available in this session.\n\
             If their tools are missing, do not give up: write a small Node.js script that uses \
             the `playwright` package, run it with `npx playwright` or `node`, and use its output \
             to complete the browser steps. Report what the script did.\n\
             [END MCP FALLBACK]",
            servers = browser.join(", ")
        )
    }
}

/// Last "<N> in, <N> out" occurrence in `text`.
fn scan_token_usage(text: &str) -> Option<TokenUsage> {
    let caps = TOKEN_USAGE.captures_iter(text).last()?;
    let parse = |i: usize| -> Option<u64> { caps.get(i)?.as_str().replace(',', "").parse().ok() };
    Some(TokenUsage {
        input_tokens: parse(1)?,
        output_tokens: parse(2)?,
    })
}
