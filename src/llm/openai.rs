use crate::llm::{CompletionProvider, CompletionRequest, MessageRole};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions client. Tool-role history entries are
/// mapped onto user messages, since the tool protocol here is plain text.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: request.system_prompt,
        }];
        for message in request.messages {
            let (role, content) = match message.role {
                MessageRole::User => ("user", message.content),
                MessageRole::Assistant => ("assistant", message.content),
                MessageRole::Tool => ("user", format!("Tool result: {}", message.content)),
            };
            messages.push(ChatMessage {
                role: role.to_string(),
                content,
            });
        }

        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.2,
        };
        debug!("Requesting completion from {}", self.base_url);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Completion request failed ({}): {}", status, text));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Completion response contained no choices"))
    }
}
