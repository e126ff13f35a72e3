use crate::types::{Tool, ToolResult, WriteAgentUpdate};
use crate::update::UpdateSink;
use crate::vfs::Vfs;
use tracing::{debug, warn};

pub struct ToolExecutor {}

impl ToolExecutor {
    /// Execute one tool call against a workspace. Storage errors are folded
    /// into a failed `ToolResult` so the agent loop stays alive and the
    /// model can self-correct on the next iteration.
    pub fn execute(vfs: &Vfs, workspace: &str, sink: &dyn UpdateSink, tool: &Tool) -> ToolResult {
        debug!("Executing tool {} in workspace {}", tool.name(), workspace);

        let result = match tool {
            Tool::CreateFolder { path } => {
                let existed = matches!(vfs.list(workspace, path), Ok(Some(_)));
                match vfs.mkdir(workspace, path) {
                    Ok(true) => {
                        if existed {
                            // Idempotent no-op: the tree did not change
                            ToolResult::success(tool, format!("Folder {} already exists", path))
                        } else {
                            sink.notify(WriteAgentUpdate::FileSystemChanged);
                            ToolResult::success(tool, format!("Created folder {}", path))
                        }
                    }
                    Ok(false) => ToolResult::failure(
                        tool,
                        format!(
                            "Cannot create folder at {}: a file is in the way or the path is invalid",
                            path
                        ),
                    ),
                    Err(e) => ToolResult::failure(tool, format!("Storage error: {}", e)),
                }
            }

            Tool::CreateDocument { path, content } | Tool::UpdateDocument {
                path,
                new_content: content,
            } => match vfs.write(workspace, path, content) {
                Ok(outcome) if outcome.success => {
                    sink.notify(WriteAgentUpdate::FileSystemChanged);
                    let message = outcome
                        .message
                        .unwrap_or_else(|| format!("Wrote document {}", path));
                    ToolResult::success(tool, message)
                }
                Ok(outcome) => ToolResult::failure(
                    tool,
                    outcome
                        .message
                        .unwrap_or_else(|| format!("Could not write document {}", path)),
                ),
                Err(e) => ToolResult::failure(tool, format!("Storage error: {}", e)),
            },

            Tool::ReadDocument { path } => match vfs.read(workspace, path) {
                Ok(Some(content)) => ToolResult::success(tool, content),
                Ok(None) => ToolResult::failure(
                    tool,
                    format!("Document {} not found or is a folder", path),
                ),
                Err(e) => ToolResult::failure(tool, format!("Storage error: {}", e)),
            },

            // No VFS effect; the external task-list owner matches the item
            // by exact description text.
            Tool::MarkTodoDone { item_description } => {
                sink.notify(WriteAgentUpdate::TodoCompleted(item_description.clone()));
                ToolResult::success(tool, format!("Marked todo as done: {}", item_description))
            }

            // The agent does not block waiting for an answer; the question
            // stays visible in the conversation history.
            Tool::AskClarification { question } => {
                sink.notify(WriteAgentUpdate::Status(format!("Agent asks: {}", question)));
                ToolResult::success(
                    tool,
                    "Question shown to the user. Continue with your best judgement.",
                )
            }

            // Terminal; the agent loop handles this before execution
            Tool::FinishWriting => ToolResult::success(tool, "Nothing to execute"),
        };

        if !result.success {
            warn!(
                "Tool {} failed: {:?}",
                result.tool_name,
                result.error.as_deref()
            );
        }
        result
    }
}
