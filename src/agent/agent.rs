use crate::llm::{CompletionProvider, CompletionRequest, Message, MessageRole};
use crate::prompts;
use crate::tools::{parse_tool_call, ToolExecutor};
use crate::types::{Tool, WriteAgentUpdate};
use crate::update::UpdateSink;
use crate::vfs::Vfs;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const MAX_ITERATIONS: usize = 10;

const SYSTEM_MESSAGE: &str = include_str!("../../resources/system_message.md");

/// Drives the workspace from a markdown task list: prompt the model, parse
/// one tool call per turn, execute it against the VFS, feed the result back,
/// at most `MAX_ITERATIONS` times. Strictly sequential; one completion
/// request or tool call in flight at a time.
pub struct WriteAgent {
    provider: Box<dyn CompletionProvider>,
    vfs: Vfs,
    workspace_id: String,
    task_list: String,
    context_documents: HashMap<String, String>,
    sink: Box<dyn UpdateSink>,
    history: Vec<Message>,
}

impl WriteAgent {
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        vfs: Vfs,
        workspace_id: String,
        task_list: String,
        context_documents: HashMap<String, String>,
        sink: Box<dyn UpdateSink>,
    ) -> Self {
        Self {
            provider,
            vfs,
            workspace_id,
            task_list,
            context_documents,
            sink,
            history: Vec::new(),
        }
    }

    /// Run the agent to completion. Never fails past this boundary: every
    /// outcome, success or failure, is reported through the update sink.
    pub async fn start(&mut self) {
        self.status("Starting agent...");

        if !task_list_looks_valid(&self.task_list) {
            self.status("Agent failed.");
            self.error(
                "The task list does not look like a markdown list. \
                 Use items like '- item', '* item', '1. item' or '[ ] item'.",
            );
            return;
        }

        debug!("Starting write agent for workspace {}", self.workspace_id);
        self.history.push(Message::new(
            MessageRole::User,
            prompts::build_task_prompt(&self.task_list, &self.context_documents),
        ));

        for iteration in 1..=MAX_ITERATIONS {
            self.status(format!("Iteration {}/{}...", iteration, MAX_ITERATIONS));

            let request = CompletionRequest {
                messages: self.history.clone(),
                system_prompt: SYSTEM_MESSAGE.to_string(),
            };
            let response = match self.provider.complete(request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Completion request failed: {}", e);
                    self.status("Agent failed.");
                    self.error(format!("Model request failed: {}", e));
                    return;
                }
            };
            self.history
                .push(Message::new(MessageRole::Assistant, response.clone()));

            match parse_tool_call(&response) {
                Some(Tool::FinishWriting) => {
                    self.status("Agent decided to finish.");
                    break;
                }
                None => {
                    // Implicit-finish policy: a turn without a recognizable
                    // tool call counts as completion, not as an error.
                    self.status("Agent did not call a tool. Finishing...");
                    break;
                }
                Some(tool) => {
                    self.status(format!("Executing tool: {}...", tool.name()));
                    let result = ToolExecutor::execute(
                        &self.vfs,
                        &self.workspace_id,
                        self.sink.as_ref(),
                        &tool,
                    );
                    if result.success {
                        self.status(format!("Tool {} succeeded.", tool.name()));
                    } else {
                        self.status(format!("Tool {} failed.", tool.name()));
                        self.error(
                            result
                                .error
                                .clone()
                                .unwrap_or_else(|| format!("Tool {} failed", tool.name())),
                        );
                    }
                    // The result goes into history either way so the model
                    // can self-correct on the next iteration.
                    self.history
                        .push(Message::new(MessageRole::Tool, result.format_message()));
                }
            }

            if iteration == MAX_ITERATIONS {
                self.status("Reached maximum iterations. Stopping agent.");
            }
        }

        self.status("Agent finished.");
    }

    fn status(&self, message: impl Into<String>) {
        self.sink.notify(WriteAgentUpdate::Status(message.into()));
    }

    fn error(&self, message: impl Into<String>) {
        self.sink.notify(WriteAgentUpdate::Error(message.into()));
    }
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*]\s+|\d+\.\s+|\[[ xX]\])").expect("valid list item regex")
    })
}

/// The initial task list must resemble a markdown list: at least half of its
/// non-empty lines have to look like list items.
fn task_list_looks_valid(task_list: &str) -> bool {
    let lines: Vec<&str> = task_list
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return false;
    }
    let items = lines
        .iter()
        .filter(|line| list_item_re().is_match(line))
        .count();
    items * 2 >= lines.len()
}
