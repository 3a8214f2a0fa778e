//! Capture pipeline: enrich a memory through conversation, then extract it
//! into the tenant's graph when the user signals the end.

use super::Pipeline;
use crate::conversation::ConversationLog;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompts;
use crate::retrieval::MemoryIngest;
use crate::shared::{last_user_turn, render_transcript, Role, Turn, TurnContent};
use crate::vision::VisionService;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CapturePipeline {
    tenant_id: String,
    conversations: Arc<ConversationLog>,
    llm: Arc<dyn LanguageModel>,
    vision: Option<Arc<dyn VisionService>>,
    ingest: Arc<dyn MemoryIngest>,
}

impl CapturePipeline {
    pub fn new(
        tenant_id: String,
        conversations: Arc<ConversationLog>,
        llm: Arc<dyn LanguageModel>,
        vision: Option<Arc<dyn VisionService>>,
        ingest: Arc<dyn MemoryIngest>,
    ) -> Self {
        Self {
            tenant_id,
            conversations,
            llm,
            vision,
            ingest,
        }
    }

    /// Entry 0 carries the developer preamble. Checking its role, not a
    /// separate "created" flag, is what makes injection idempotent.
    fn has_preamble(history: &[Turn]) -> bool {
        history.first().map(|t| t.role) == Some(Role::Developer)
    }

    fn ensure_preamble(&self, session_id: &str) {
        let history = self.conversations.get(&self.tenant_id, session_id);
        if !Self::has_preamble(&history) {
            self.conversations.append(
                &self.tenant_id,
                session_id,
                Role::Developer,
                TurnContent::Text(prompts::CAPTURE_PREAMBLE.to_string()),
            );
        }
    }

    /// Appends a vision-derived description to the user message when the
    /// latest user turn carries images. Failure is non-fatal: processing
    /// continues with the original text.
    async fn enrich_with_vision(&self, user_message: &str, history: &[Turn]) -> String {
        let Some(vision) = &self.vision else {
            return user_message.to_string();
        };
        let images = match last_user_turn(history) {
            Some(turn) => turn.content.images(),
            None => Vec::new(),
        };
        if images.is_empty() {
            return user_message.to_string();
        }
        match vision.describe(&images, prompts::DESCRIBE_IMAGE).await {
            Ok(description) => prompts::enriched_user_message(user_message, &description),
            Err(e) => {
                tracing::debug!(
                    target: "engrammer::pipeline",
                    tenant = %self.tenant_id,
                    "vision enrichment skipped: {e}"
                );
                user_message.to_string()
            }
        }
    }

    /// Explicit end-of-conversation signal: the literal sentinel, or a
    /// positive semantic classification — whichever triggers first.
    async fn is_termination(&self, user_message: &str) -> Result<bool> {
        if user_message.trim().eq_ignore_ascii_case(prompts::TERMINATION_SENTINEL) {
            return Ok(true);
        }
        let verdict = self
            .llm
            .classify(prompts::TERMINATION_CLASSIFIER, user_message)
            .await?;
        Ok(verdict.trim().eq_ignore_ascii_case("true"))
    }

    /// Terminal branch: summarize, persist, reset to a fresh preamble.
    /// Terminal for the session's topic, not for the session id.
    async fn finalize(&self, session_id: &str) -> Result<String> {
        let history = self.conversations.get(&self.tenant_id, session_id);
        let transcript = render_transcript(&history, Role::Developer);
        let summary = self
            .llm
            .classify(prompts::SUMMARIZE_CONVERSATION, &transcript)
            .await?;

        self.ingest.ingest(&summary).await?;
        tracing::info!(
            target: "engrammer::pipeline",
            tenant = %self.tenant_id,
            session = %session_id,
            "memory persisted, resetting session"
        );

        self.conversations.clear(&self.tenant_id, session_id);
        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::Developer,
            TurnContent::Text(prompts::CAPTURE_PREAMBLE.to_string()),
        );
        Ok(prompts::capture_confirmation(&summary))
    }
}

#[async_trait]
impl Pipeline for CapturePipeline {
    async fn invoke(
        &self,
        session_id: &str,
        user_message: &str,
        history: &[Turn],
    ) -> Result<String> {
        self.ensure_preamble(session_id);

        let user_message = self.enrich_with_vision(user_message, history).await;

        if self.is_termination(&user_message).await? {
            return self.finalize(session_id).await;
        }

        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::User,
            TurnContent::Text(user_message),
        );

        let response = self
            .llm
            .complete(&self.conversations.get(&self.tenant_id, session_id))
            .await?;

        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::Assistant,
            TurnContent::Text(response.clone()),
        );
        Ok(response)
    }

    async fn end_conversation(&self, session_id: &str) -> Result<String> {
        self.ensure_preamble(session_id);
        self.finalize(session_id).await
    }
}
