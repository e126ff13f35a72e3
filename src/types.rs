use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One node in a workspace tree. A node is either a folder with uniquely
/// named children or a file with text content, never both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VfsNode {
    Folder { children: HashMap<String, VfsNode> },
    File { content: String },
}

impl VfsNode {
    pub fn empty_folder() -> Self {
        VfsNode::Folder {
            children: HashMap::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, VfsNode::File { .. })
    }
}

/// One bounded-size fragment of a document produced by the content splitter.
/// `part` is 1-based; concatenating all parts in order reproduces the
/// original content exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSplit {
    pub path: String,
    pub content: String,
    pub part: usize,
    pub total_parts: usize,
}

/// Result of the cheap line-count pre-check for oversized content.
#[derive(Debug, Clone)]
pub struct LargeFileCheck {
    pub is_large: bool,
    pub line_count: usize,
    pub message: String,
}

/// Outcome of a VFS write. `message` carries the human-readable notice when
/// the content was split into parts.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl WriteOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Available tools the write agent can call
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "tool", content = "params")]
pub enum Tool {
    /// Create a folder, including missing parents
    CreateFolder { path: String },
    /// Create a document with the given content
    CreateDocument { path: String, content: String },
    /// Replace the content of an existing document
    UpdateDocument { path: String, new_content: String },
    /// Read a document's content into the conversation
    ReadDocument { path: String },
    /// Mark one task-list item as completed
    MarkTodoDone { item_description: String },
    /// Surface a question to the user without blocking
    AskClarification { question: String },
    /// Signal that the task is finished
    FinishWriting,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::CreateFolder { .. } => "create_folder",
            Tool::CreateDocument { .. } => "create_document",
            Tool::UpdateDocument { .. } => "update_document",
            Tool::ReadDocument { .. } => "read_document",
            Tool::MarkTodoDone { .. } => "mark_todo_done",
            Tool::AskClarification { .. } => "ask_clarification",
            Tool::FinishWriting => "finish_writing",
        }
    }

    /// Parameters as a JSON object, for history entries and `ToolResult`
    pub fn params(&self) -> serde_json::Value {
        match self {
            Tool::CreateFolder { path } => serde_json::json!({ "path": path }),
            Tool::CreateDocument { path, content } => {
                serde_json::json!({ "path": path, "content": content })
            }
            Tool::UpdateDocument { path, new_content } => {
                serde_json::json!({ "path": path, "new_content": new_content })
            }
            Tool::ReadDocument { path } => serde_json::json!({ "path": path }),
            Tool::MarkTodoDone { item_description } => {
                serde_json::json!({ "item_description": item_description })
            }
            Tool::AskClarification { question } => {
                serde_json::json!({ "question": question })
            }
            Tool::FinishWriting => serde_json::json!({}),
        }
    }
}

/// Result of a single executed tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub tool_params: serde_json::Value,
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool: &Tool, result: impl Into<String>) -> Self {
        Self {
            tool_name: tool.name().to_string(),
            tool_params: tool.params(),
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(tool: &Tool, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool.name().to_string(),
            tool_params: tool.params(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    // Format a message suitable for the tool-role history entry
    pub fn format_message(&self) -> String {
        if self.success {
            match &self.result {
                Some(result) => format!("Tool {} succeeded: {}", self.tool_name, result),
                None => format!("Tool {} succeeded", self.tool_name),
            }
        } else {
            format!(
                "Tool {} failed: {}",
                self.tool_name,
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// Notifications emitted by the write agent while it runs
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAgentUpdate {
    /// Progress message for display
    Status(String),
    /// Human-readable failure description
    Error(String),
    /// The workspace tree changed; consumers should re-read it
    FileSystemChanged,
    /// One task-list item was completed, matched by exact description text
    TodoCompleted(String),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to parse tool call: {0}")]
    ParseError(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}
