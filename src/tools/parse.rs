use crate::types::{Tool, ToolError};
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

fn tool_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(create_folder|create_document|update_document|read_document|mark_todo_done|ask_clarification|finish_writing)\s*\(",
        )
        .expect("valid tool call regex")
    })
}

fn finish_writing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfinish_writing\s*\(\s*(\{\s*\})?\s*\)").expect("valid finish regex")
    })
}

/// Extract one tool call of the shape `name({json})` from free model text.
///
/// A single surrounding fenced block is stripped first. The first occurrence
/// of a known tool name followed by a balanced, valid argument object wins;
/// prose that merely mentions a tool name (no object, unbalanced braces,
/// invalid JSON, missing or ill-typed required fields) is skipped rather
/// than committing the whole turn to a failed parse. If no full-shape call
/// exists, the dedicated empty-argument form `finish_writing()` is accepted,
/// since that tool carries no parameters. Otherwise `None`, which the agent
/// treats as "no tool called".
pub fn parse_tool_call(text: &str) -> Option<Tool> {
    let cleaned = strip_fence(text);

    for captures in tool_call_re().captures_iter(cleaned) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let rest = cleaned[whole.end()..].trim_start();

        let raw = match extract_object(rest) {
            Some(raw) => raw,
            None => {
                trace!("Skipping mention of {} without an argument object", name);
                continue;
            }
        };
        // Models occasionally escape underscores markdown-style; repair the
        // one known defect before parsing.
        let repaired = raw.replace("\\_", "_");
        let params: serde_json::Value = match serde_json::from_str(&repaired) {
            Ok(value) => value,
            Err(e) => {
                trace!("Tool call {} arguments are not valid JSON: {}", name, e);
                continue;
            }
        };

        match tool_from_params(name, &params) {
            Ok(tool) => return Some(tool),
            Err(e) => {
                trace!("Rejected tool call: {}", e);
                continue;
            }
        }
    }

    if finish_writing_re().is_match(cleaned) {
        return Some(Tool::FinishWriting);
    }
    None
}

/// Strip a single leading/trailing fence (with optional language tag)
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Return the balanced `{...}` span at the start of `s`, honoring JSON
/// string literals so braces inside parameter values do not end the span.
fn extract_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn required_str(params: &serde_json::Value, key: &str) -> Result<String, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ToolError::ParseError(format!("Missing required parameter: {}", key)))
}

fn tool_from_params(name: &str, params: &serde_json::Value) -> Result<Tool, ToolError> {
    if !params.is_object() {
        return Err(ToolError::ParseError(
            "Tool arguments must be a JSON object".into(),
        ));
    }
    match name {
        "create_folder" => Ok(Tool::CreateFolder {
            path: required_str(params, "path")?,
        }),
        "create_document" => Ok(Tool::CreateDocument {
            path: required_str(params, "path")?,
            content: required_str(params, "content")?,
        }),
        "update_document" => Ok(Tool::UpdateDocument {
            path: required_str(params, "path")?,
            new_content: required_str(params, "new_content")?,
        }),
        "read_document" => Ok(Tool::ReadDocument {
            path: required_str(params, "path")?,
        }),
        "mark_todo_done" => Ok(Tool::MarkTodoDone {
            item_description: required_str(params, "item_description")?,
        }),
        "ask_clarification" => Ok(Tool::AskClarification {
            question: required_str(params, "question")?,
        }),
        "finish_writing" => Ok(Tool::FinishWriting),
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}
