use super::*;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::types::WriteAgentUpdate;
use crate::update::UpdateSink;
use crate::vfs::{MemoryStore, Vfs};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Mock completion provider, returning canned responses in order
struct MockProvider {
    responses: Mutex<Vec<Result<String>>>,
}

impl MockProvider {
    fn new(mut responses: Vec<Result<String>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(anyhow::anyhow!("No more mock responses")))
    }
}

// Collecting update sink
#[derive(Default, Clone)]
struct RecordingSink {
    updates: Arc<Mutex<Vec<WriteAgentUpdate>>>,
}

impl RecordingSink {
    fn updates(&self) -> Vec<WriteAgentUpdate> {
        self.updates.lock().unwrap().clone()
    }

    fn statuses(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|update| match update {
                WriteAgentUpdate::Status(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn errors(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|update| match update {
                WriteAgentUpdate::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn count(&self, update: &WriteAgentUpdate) -> usize {
        self.updates().iter().filter(|u| *u == update).count()
    }
}

impl UpdateSink for RecordingSink {
    fn notify(&self, update: WriteAgentUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn test_agent(
    responses: Vec<Result<String>>,
    task_list: &str,
) -> (WriteAgent, Vfs, RecordingSink) {
    let vfs = Vfs::new(Arc::new(MemoryStore::new()));
    let sink = RecordingSink::default();
    let agent = WriteAgent::new(
        Box::new(MockProvider::new(responses)),
        vfs.clone(),
        "ws-test".to_string(),
        task_list.to_string(),
        HashMap::new(),
        Box::new(sink.clone()),
    );
    (agent, vfs, sink)
}

fn finished_count(sink: &RecordingSink) -> usize {
    sink.statuses()
        .iter()
        .filter(|s| s.as_str() == "Agent finished.")
        .count()
}

#[tokio::test]
async fn test_successful_multi_step_run() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![
            Ok(r#"create_document({"path": "/a.md", "content": "hi"})"#.to_string()),
            Ok(r#"create_folder({"path": "/img"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Create a.md\n- Create folder /img",
    );

    agent.start().await;

    assert_eq!(vfs.read("ws-test", "/a.md")?.as_deref(), Some("hi"));
    assert!(vfs.list("ws-test", "/img")?.is_some());

    let statuses = sink.statuses();
    assert!(statuses.contains(&"Agent decided to finish.".to_string()));
    assert_eq!(finished_count(&sink), 1);
    assert_eq!(sink.count(&WriteAgentUpdate::FileSystemChanged), 2);
    assert!(sink.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_task_list_fails_before_the_loop() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(vec![], "please just do something");

    agent.start().await;

    let updates = sink.updates();
    assert_eq!(
        updates[0],
        WriteAgentUpdate::Status("Starting agent...".to_string())
    );
    assert_eq!(
        updates[1],
        WriteAgentUpdate::Status("Agent failed.".to_string())
    );
    assert!(matches!(updates[2], WriteAgentUpdate::Error(_)));
    assert_eq!(updates.len(), 3);

    // No iteration ran, nothing was executed
    assert!(sink.statuses().iter().all(|s| !s.starts_with("Iteration")));
    assert_eq!(vfs.list("ws-test", "/")?, Some(vec![]));
    assert_eq!(finished_count(&sink), 0);
    Ok(())
}

#[tokio::test]
async fn test_no_tool_response_is_implicit_finish() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![Ok("All items look complete to me.".to_string())],
        "- Do the thing",
    );

    agent.start().await;

    assert!(sink
        .statuses()
        .contains(&"Agent did not call a tool. Finishing...".to_string()));
    assert_eq!(finished_count(&sink), 1);
    assert!(sink.errors().is_empty());
    assert_eq!(vfs.list("ws-test", "/")?, Some(vec![]));
    Ok(())
}

#[tokio::test]
async fn test_loop_terminates_at_max_iterations() {
    // The model never finishes; every turn writes the same document.
    let responses = (0..MAX_ITERATIONS + 5)
        .map(|_| Ok(r#"update_document({"path": "/a.md", "new_content": "again"})"#.to_string()))
        .collect();
    let (mut agent, _vfs, sink) = test_agent(responses, "- Loop forever");

    agent.start().await;

    let statuses = sink.statuses();
    assert!(statuses.contains(&format!("Iteration {}/{}...", MAX_ITERATIONS, MAX_ITERATIONS)));
    assert!(!statuses.contains(&format!(
        "Iteration {}/{}...",
        MAX_ITERATIONS + 1,
        MAX_ITERATIONS
    )));
    assert!(statuses.contains(&"Reached maximum iterations. Stopping agent.".to_string()));
    assert_eq!(finished_count(&sink), 1);
}

#[tokio::test]
async fn test_completion_failure_is_fatal() {
    let (mut agent, _vfs, sink) = test_agent(
        vec![Err(anyhow::anyhow!("connection reset"))],
        "- Do the thing",
    );

    agent.start().await;

    let statuses = sink.statuses();
    assert!(statuses.contains(&"Agent failed.".to_string()));
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].contains("connection reset"));
    // Fatal failure and normal completion are mutually exclusive
    assert_eq!(finished_count(&sink), 0);
}

#[tokio::test]
async fn test_failed_tool_keeps_the_loop_alive() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![
            Ok(r#"create_document({"path": "/docs", "content": "x"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Write into /docs",
    );
    // A folder already occupies the target path
    assert!(vfs.mkdir("ws-test", "/docs")?);

    agent.start().await;

    let statuses = sink.statuses();
    assert!(statuses.contains(&"Tool create_document failed.".to_string()));
    assert_eq!(sink.errors().len(), 1);
    // The loop went on and finished normally
    assert!(statuses.contains(&"Agent decided to finish.".to_string()));
    assert_eq!(finished_count(&sink), 1);
    // The failed write did not emit a change signal
    assert_eq!(sink.count(&WriteAgentUpdate::FileSystemChanged), 0);
    Ok(())
}

#[tokio::test]
async fn test_existing_folder_emits_no_change_signal() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![
            Ok(r#"create_folder({"path": "/img"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Ensure /img exists",
    );
    // The folder is already there; the tool succeeds without changing anything
    assert!(vfs.mkdir("ws-test", "/img")?);

    agent.start().await;

    assert!(sink
        .statuses()
        .contains(&"Tool create_folder succeeded.".to_string()));
    assert_eq!(sink.count(&WriteAgentUpdate::FileSystemChanged), 0);
    assert_eq!(finished_count(&sink), 1);
    Ok(())
}

#[tokio::test]
async fn test_mark_todo_done_emits_completion() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![
            Ok(r#"mark_todo_done({"item_description": "Write the intro"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Write the intro",
    );

    agent.start().await;

    assert_eq!(
        sink.count(&WriteAgentUpdate::TodoCompleted(
            "Write the intro".to_string()
        )),
        1
    );
    // No VFS effect
    assert_eq!(vfs.list("ws-test", "/")?, Some(vec![]));
    assert_eq!(sink.count(&WriteAgentUpdate::FileSystemChanged), 0);
    Ok(())
}

#[tokio::test]
async fn test_ask_clarification_does_not_block() {
    let (mut agent, _vfs, sink) = test_agent(
        vec![
            Ok(r#"ask_clarification({"question": "Which tone should I use?"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Draft the letter",
    );

    agent.start().await;

    let statuses = sink.statuses();
    assert!(statuses
        .iter()
        .any(|s| s.contains("Which tone should I use?")));
    // The agent moved on to the next iteration instead of waiting
    assert!(statuses.contains(&"Iteration 2/10...".to_string()));
    assert_eq!(finished_count(&sink), 1);
}

#[tokio::test]
async fn test_read_document_feeds_content_back() -> Result<()> {
    let (mut agent, vfs, sink) = test_agent(
        vec![
            Ok(r#"read_document({"path": "/notes.md"})"#.to_string()),
            Ok("finish_writing({})".to_string()),
        ],
        "- Review the notes",
    );
    vfs.write("ws-test", "/notes.md", "remember the deadline")?;

    agent.start().await;

    assert!(sink
        .statuses()
        .contains(&"Tool read_document succeeded.".to_string()));
    assert!(sink.errors().is_empty());
    Ok(())
}
