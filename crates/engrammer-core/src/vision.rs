//! Vision description boundary (optional multimodal enrichment).
//!
//! Absent configuration disables enrichment entirely; a failing call is
//! degraded to text-only processing by the consuming pipeline, never
//! surfaced to the user.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Image-to-text capability.
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Describe the given base64-encoded images following `instructions`.
    async fn describe(&self, images: &[String], instructions: &str) -> Result<String>;
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Bridge to an Ollama-style `/api/chat` endpoint with image support.
pub struct OllamaVision {
    host: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaVision {
    /// `Some` only when a vision host is configured; an unset host disables
    /// multimodal enrichment entirely.
    pub fn from_config(cfg: &crate::config::CoreConfig) -> Option<Self> {
        cfg.vision_host
            .as_ref()
            .map(|host| Self::new(host.clone(), cfg.vision_model.clone()))
    }

    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }
}

#[async_trait]
impl VisionService for OllamaVision {
    async fn describe(&self, images: &[String], instructions: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: instructions.to_string(),
                images: images.to_vec(),
            }],
            stream: false,
        };

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Connectivity(format!("vision request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(Error::Connectivity(format!("vision API error {status}")));
        }

        let parsed: OllamaChatResponse = res
            .json()
            .await
            .map_err(|e| Error::Connectivity(format!("vision response parse failed: {e}")))?;

        Ok(parsed.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;

    #[test]
    fn vision_is_disabled_without_a_host() {
        assert!(OllamaVision::from_config(&CoreConfig::default()).is_none());

        let cfg = CoreConfig {
            vision_host: Some("http://localhost:11434/".to_string()),
            ..CoreConfig::default()
        };
        let vision = OllamaVision::from_config(&cfg).unwrap();
        assert_eq!(vision.host, "http://localhost:11434");
        assert_eq!(vision.model, "gemma3:4b");
    }
}
