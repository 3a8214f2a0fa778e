//! Language-model service boundary and the OpenAI-compatible bridge.
//!
//! Pipelines consume two capabilities: free-form completion over a turn
//! history, and single-shot classification (gating, topic extraction,
//! termination detection, summarization). Both are synchronous calls that
//! may fail with a transient connectivity error; the core never retries.

use crate::error::{Error, Result};
use crate::shared::{ContentPart, Turn, TurnContent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat/completion capability consumed by every pipeline.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate the next assistant message for the given history.
    async fn complete(&self, turns: &[Turn]) -> Result<String>;

    /// One-shot classification or extraction: `instructions` as the system
    /// message, `input` as the sole user message.
    async fn classify(&self, instructions: &str, input: &str) -> Result<String>;
}

// OpenAI-compatible request/response shapes.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn wire_content(content: &TurnContent) -> serde_json::Value {
    match content {
        TurnContent::Text(t) => serde_json::Value::String(t.clone()),
        TurnContent::Parts(parts) => serde_json::Value::Array(
            parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                    ContentPart::ImageUrl { url } => serde_json::json!({
                        "type": "image_url",
                        "image_url": { "url": url },
                    }),
                })
                .collect(),
        ),
    }
}

/// Bridge to an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatBridge {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl ChatBridge {
    /// Bridge wired from the environment-driven core configuration.
    pub fn from_config(cfg: &crate::config::CoreConfig) -> Self {
        Self::new(
            cfg.llm_base_url.clone(),
            cfg.llm_api_key.clone(),
            cfg.llm_model.clone(),
        )
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            client,
        }
    }

    async fn send(&self, messages: Vec<WireMessage>, temperature: Option<f32>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
        };

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Connectivity(format!("chat request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Connectivity(format!("chat API error {status}: {body}")));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| Error::Connectivity(format!("chat response parse failed: {e}")))?;

        Ok(parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl LanguageModel for ChatBridge {
    async fn complete(&self, turns: &[Turn]) -> Result<String> {
        let messages = turns
            .iter()
            .map(|t| WireMessage {
                role: t.role.as_str().to_string(),
                content: wire_content(&t.content),
            })
            .collect();
        self.send(messages, None).await
    }

    async fn classify(&self, instructions: &str, input: &str) -> Result<String> {
        let messages = vec![
            WireMessage {
                role: "system".to_string(),
                content: serde_json::Value::String(instructions.to_string()),
            },
            WireMessage {
                role: "user".to_string(),
                content: serde_json::Value::String(input.to_string()),
            },
        ];
        let out = self.send(messages, Some(0.0)).await?;
        Ok(out.trim().to_string())
    }
}
