use std::collections::HashMap;

/// Tool catalogue inlined into the initial task prompt
pub const TOOL_CATALOG: &str = r#"Available tools:

- create_folder({"path": "/folder"}) — create a folder (missing parents are created too)
- create_document({"path": "/doc.md", "content": "..."}) — create a document
- update_document({"path": "/doc.md", "new_content": "..."}) — replace a document's content
- read_document({"path": "/doc.md"}) — read a document's content
- mark_todo_done({"item_description": "..."}) — mark one task-list item as completed, by its exact text
- ask_clarification({"question": "..."}) — surface a question to the user (non-blocking)
- finish_writing({}) — declare the whole task list finished"#;

/// Build the single user-role entry that seeds the conversation: task list,
/// inlined context documents, tool catalogue and usage rules.
pub fn build_task_prompt(task_list: &str, context_documents: &HashMap<String, String>) -> String {
    let mut prompt = format!("Work through the following task list:\n\n{}\n", task_list);

    if !context_documents.is_empty() {
        prompt.push_str("\nContext documents:\n");
        // Sorted so the prompt is stable across runs
        let mut names: Vec<&String> = context_documents.keys().collect();
        names.sort();
        for name in names {
            prompt.push_str(&format!("\n### {}\n{}\n", name, context_documents[name]));
        }
    }

    prompt.push_str(&format!(
        "\n{}\n\nCall one tool per turn. Mark each item done as you complete it, \
         and call finish_writing({{}}) when everything is done.\n",
        TOOL_CATALOG
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_tasks_and_context() {
        let mut context = HashMap::new();
        context.insert("notes".to_string(), "Some research notes".to_string());
        let prompt = build_task_prompt("- Write the intro", &context);
        assert!(prompt.contains("- Write the intro"));
        assert!(prompt.contains("### notes"));
        assert!(prompt.contains("Some research notes"));
        assert!(prompt.contains("create_document"));
        assert!(prompt.contains("finish_writing"));
    }
}
