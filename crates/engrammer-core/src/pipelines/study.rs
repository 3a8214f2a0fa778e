//! Study pipeline: guides a student through one activity question, with
//! vector-retrieved course context passed ephemerally into the completion.
//!
//! Session ids are composite: `{activity_id}__{question_id}`.

use super::{ActivityCatalog, Pipeline};
use crate::conversation::ConversationLog;
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::prompts;
use crate::retrieval::Retriever;
use crate::shared::{render_transcript, Role, Turn, TurnContent};
use async_trait::async_trait;
use std::sync::Arc;

const TOP_K: usize = 3;

pub struct StudyPipeline {
    tenant_id: String,
    conversations: Arc<ConversationLog>,
    llm: Arc<dyn LanguageModel>,
    vector: Arc<dyn Retriever>,
    activities: Arc<dyn ActivityCatalog>,
}

impl StudyPipeline {
    pub fn new(
        tenant_id: String,
        conversations: Arc<ConversationLog>,
        llm: Arc<dyn LanguageModel>,
        vector: Arc<dyn Retriever>,
        activities: Arc<dyn ActivityCatalog>,
    ) -> Self {
        Self {
            tenant_id,
            conversations,
            llm,
            vector,
            activities,
        }
    }

    fn split_session_id(session_id: &str) -> Result<(&str, &str)> {
        session_id
            .split_once("__")
            .filter(|(a, q)| !a.is_empty() && !q.is_empty())
            .ok_or_else(|| Error::MalformedSessionId(session_id.to_string()))
    }

    fn has_preamble(history: &[Turn]) -> bool {
        history.first().map(|t| t.role) == Some(Role::System)
    }

    fn ensure_preamble(&self, session_id: &str) -> Result<()> {
        let history = self.conversations.get(&self.tenant_id, session_id);
        if Self::has_preamble(&history) {
            return Ok(());
        }
        let (activity_id, question_id) = Self::split_session_id(session_id)?;
        let question = self
            .activities
            .question(activity_id, question_id)
            .ok_or_else(|| Error::UnknownQuestion {
                activity_id: activity_id.to_string(),
                question_id: question_id.to_string(),
            })?;
        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::System,
            TurnContent::Text(prompts::study_preamble(
                &question.context,
                &question.question,
                &question.expected_answer,
            )),
        );
        Ok(())
    }
}

#[async_trait]
impl Pipeline for StudyPipeline {
    async fn invoke(
        &self,
        session_id: &str,
        user_message: &str,
        _history: &[Turn],
    ) -> Result<String> {
        self.ensure_preamble(session_id)?;

        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::User,
            TurnContent::Text(user_message.to_string()),
        );

        let transcript = render_transcript(
            &self.conversations.get(&self.tenant_id, session_id),
            Role::System,
        );
        let search_topic = self
            .llm
            .classify(&prompts::study_search_prompt(&transcript), user_message)
            .await?;

        let context = self.vector.search(&search_topic, TOP_K).await?;

        // Retrieved context rides along for this completion only; it is
        // never written into the session log.
        let mut messages = self.conversations.get(&self.tenant_id, session_id);
        if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
            messages.push(Turn::text(Role::System, prompts::study_context_message(&ctx)));
        }

        let response = self.llm.complete(&messages).await?;
        if response.trim().is_empty() {
            return Err(Error::Connectivity(
                "language model returned an empty response".to_string(),
            ));
        }

        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::Assistant,
            TurnContent::Text(response.clone()),
        );
        Ok(response)
    }

    async fn end_conversation(&self, session_id: &str) -> Result<String> {
        self.conversations.clear(&self.tenant_id, session_id);
        Ok(prompts::SESSION_RESET_REPLY.to_string())
    }
}
