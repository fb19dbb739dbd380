//! Completion client for the hosted chat API
//!
//! Implements the request contract: every outbound request carries the
//! zero-or-one synthetic context message first, then the live conversation
//! turns in chronological order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::client::{ApiClient, ApiError};
use super::stream::CompletionStream;
use crate::config::Config;

const CHAT_PATH: &str = "v1/chat/completions";

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for the completion endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Non-streaming response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Health endpoint response.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Prepend the synthetic context message (if any) to the live turns.
pub fn with_context(context: Option<ChatMessage>, turns: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    if let Some(ctx) = context {
        messages.push(ctx);
    }
    messages.extend_from_slice(turns);
    messages
}

/// Client for the hosted completion endpoint.
pub struct ChatClient {
    api: ApiClient,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl ChatClient {
    pub fn new(api: ApiClient, model: &str, max_tokens: u32) -> Self {
        Self {
            api,
            model: model.to_string(),
            max_tokens,
            temperature: None,
        }
    }

    /// Build a client from configuration. The API key is read from the
    /// environment variable the config names and attached as a bearer
    /// header on every request.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = std::env::var(&config.api.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api.api_key_env))?;

        let api = ApiClient::new(&config.api.base_url)?.with_bearer_auth(api_key);

        let mut client = Self::new(api, &config.api.model, config.api.max_tokens);
        client.temperature = config.api.temperature;
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ChatMessage>, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: stream.then_some(true),
        }
    }

    /// Send a full conversation and wait for the complete reply.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<ChatMessage, ApiError> {
        let request = self.request(messages, false);
        let response: ChatResponse = self.api.post_json(CHAT_PATH, &request).await?;
        Ok(response.message)
    }

    /// Send a full conversation and consume the reply incrementally.
    pub async fn stream(&self, messages: Vec<ChatMessage>) -> Result<CompletionStream, ApiError> {
        let request = self.request(messages, true);
        let response = self.api.post_stream(CHAT_PATH, &request).await?;
        Ok(CompletionStream::new(response))
    }

    /// Ping the endpoint's health route.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.api.get_json("health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"user""#));

        let msg = ChatMessage::system("ctx");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"system""#));
    }

    #[test]
    fn context_message_comes_first() {
        let turns = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ];
        let messages = with_context(Some(ChatMessage::system("attached context")), &turns);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[3].content, "second");
    }

    #[test]
    fn no_context_message_when_absent() {
        let turns = vec![ChatMessage::user("hi")];
        let messages = with_context(None, &turns);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn request_omits_unset_fields() {
        let client = ChatClient::new(ApiClient::new("https://api.example.com").unwrap(), "swift-1", 4096);
        let request = client.request(vec![ChatMessage::user("hi")], false);
        let json = serde_json::to_string(&request).unwrap();

        assert!(!json.contains("temperature"));
        assert!(!json.contains("stream"));
        assert!(json.contains(r#""max_tokens":4096"#));
    }

    #[test]
    fn streaming_request_sets_flag() {
        let client = ChatClient::new(ApiClient::new("https://api.example.com").unwrap(), "swift-1", 1024);
        let request = client.request(Vec::new(), true);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""stream":true"#));
    }
}
