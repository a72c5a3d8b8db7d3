use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;

use subagent_core::api::{ContextConfig, FileInfo, FileMode, FileRef};

/// Line budgets for the condensed modes.
#[derive(Debug, Clone, Copy)]
pub struct RenderLimits {
    pub head_lines: usize,
    pub tail_lines: usize,
    pub grep_max_matches: usize,
}

impl From<&ContextConfig> for RenderLimits {
    fn from(cfg: &ContextConfig) -> Self {
        Self {
            head_lines: cfg.summary_head_lines,
            tail_lines: cfg.summary_tail_lines,
            grep_max_matches: cfg.grep_max_matches.max(1),
        }
    }
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self::from(&ContextConfig::default())
    }
}

/// One file slot of the context block.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub section: String,
    /// Set when the file was actually read.
    pub read: Option<FileInfo>,
}

/// Relative references resolve against the task workspace.
pub fn resolve_path(path: &str, workspace: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        workspace.join(p)
    }
}

/// Read and render one file reference. Read failures become an `[error: ...]` body.
pub async fn render_file(file: &FileRef, workspace: &Path, limits: &RenderLimits) -> RenderedFile {
    let full_path = resolve_path(&file.path, workspace);
    let mut section = format!("### File: {} (mode: {})\n", file.path, file.mode.as_str());

    let read = match tokio::fs::read(&full_path).await {
        Ok(bytes) => {
            let size = bytes.len() as u64;
            let content = String::from_utf8_lossy(&bytes);
            let body = match file.mode {
                FileMode::Full => content.into_owned(),
                FileMode::Summary => render_summary(&file.path, &content, limits),
                FileMode::Grep => render_grep(&content, file.pattern.as_deref(), limits),
            };
            section.push_str(&body);
            Some(FileInfo {
                path: file.path.clone(),
                size,
            })
        }
        Err(e) => {
            tracing::warn!(path = %full_path.display(), error = %e, "context file unreadable");
            section.push_str(&format!("[error: cannot read {}: {}]", file.path, e));
            None
        }
    };

    if !section.ends_with('\n') {
        section.push('\n');
    }
    if let Some(hint) = file.hint.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        section.push_str("Hint: ");
        section.push_str(hint);
        section.push('\n');
    }

    RenderedFile { section, read }
}

/// JSON gets a structural outline; anything else a head/tail excerpt.
pub fn render_summary(path: &str, content: &str, limits: &RenderLimits) -> String {
    let looks_json = path.to_lowercase().ends_with(".json")
        || matches!(content.trim_start().chars().next(), Some('{') | Some('['));
    if looks_json {
        if let Ok(value) = serde_json::from_str::<Value>(content) {
            return summarize_json(&value);
        }
    }
    summarize_text(content, limits)
}

fn summarize_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut out = format!("JSON object with {} top-level keys:\n", map.len());
            for (key, v) in map {
                out.push_str(&format!("  - {}: {}\n", key, describe_json(v)));
            }
            out
        }
        Value::Array(_) => format!("JSON {}\n", describe_json(value)),
        other => format!("JSON {}\n", kind_of(other)),
    }
}

fn describe_json(v: &Value) -> String {
    match v {
        Value::Object(map) => format!("object ({} keys)", map.len()),
        Value::Array(items) => {
            let mut s = format!("array ({} items)", items.len());
            if let Some(Value::Object(first)) = items.first() {
                let keys: Vec<&str> = first.keys().map(String::as_str).collect();
                s.push_str(&format!("; first item keys: {}", keys.join(", ")));
            }
            s
        }
        other => kind_of(other).to_string(),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn summarize_text(content: &str, limits: &RenderLimits) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    let mut out = format!("Lines: {}\n", total);

    if total <= limits.head_lines + limits.tail_lines {
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }
        return out;
    }

    for line in &lines[..limits.head_lines] {
        out.push_str(line);
        out.push('\n');
    }
    let omitted = total - limits.head_lines - limits.tail_lines;
    out.push_str(&format!("... [{} lines omitted] ...\n", omitted));
    for line in &lines[total - limits.tail_lines..] {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Matching lines as `<lineno>: <line>`, 1-based, capped at `grep_max_matches`.
pub fn render_grep(content: &str, pattern: Option<&str>, limits: &RenderLimits) -> String {
    let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
        return "[error: grep mode requires a pattern]\n".to_string();
    };

    let mut out = String::new();
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(pattern, error = %e, "invalid grep pattern, matching literally");
            out.push_str("[note: invalid regular expression, matched as literal text]\n");
            match Regex::new(&regex::escape(pattern)) {
                Ok(re) => re,
                Err(e) => return format!("[error: unusable pattern {:?}: {}]\n", pattern, e),
            }
        }
    };

    let matches: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| re.is_match(line))
        .map(|(i, line)| (i + 1, line))
        .collect();

    if matches.is_empty() {
        out.push_str(&format!("No lines match {:?}\n", pattern));
        return out;
    }

    let shown = matches.len().min(limits.grep_max_matches);
    out.push_str(&format!("{} matching lines for {:?}", matches.len(), pattern));
    if shown < matches.len() {
        out.push_str(&format!(" (showing first {})", shown));
    }
    out.push('\n');
    for (lineno, line) in &matches[..shown] {
        out.push_str(&format!("{}: {}\n", lineno, line));
    }
    out
}
