//! Quiz pipeline: asks guided questions about the memory currently held in
//! working memory, switching topics (gate → retrieval cascade) on demand.

use super::Pipeline;
use crate::conversation::ConversationLog;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompts;
use crate::retrieval::RetrievalCascade;
use crate::shared::{render_transcript, Role, Turn, TurnContent};
use crate::working_memory::WorkingMemory;
use async_trait::async_trait;
use std::sync::Arc;

const TOP_K: usize = 5;

/// Only the exact affirmative token continues the current topic; anything
/// else — including malformed classifier output — switches.
fn gate_accepts(reply: &str) -> bool {
    reply.trim() == "True"
}

pub struct QuizPipeline {
    tenant_id: String,
    conversations: Arc<ConversationLog>,
    working_memory: Arc<WorkingMemory>,
    llm: Arc<dyn LanguageModel>,
    cascade: RetrievalCascade,
}

impl QuizPipeline {
    pub fn new(
        tenant_id: String,
        conversations: Arc<ConversationLog>,
        working_memory: Arc<WorkingMemory>,
        llm: Arc<dyn LanguageModel>,
        cascade: RetrievalCascade,
    ) -> Self {
        Self {
            tenant_id,
            conversations,
            working_memory,
            llm,
            cascade,
        }
    }

    fn reply(&self, session_id: &str, text: String) -> String {
        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::Assistant,
            TurnContent::Text(text.clone()),
        );
        text
    }
}

#[async_trait]
impl Pipeline for QuizPipeline {
    async fn invoke(
        &self,
        session_id: &str,
        user_message: &str,
        _history: &[Turn],
    ) -> Result<String> {
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
        let mut memory = self.working_memory.get(&self.tenant_id, session_id);

        let gate = self
            .llm
            .classify(&prompts::quiz_gate_prompt(&transcript, &memory), user_message)
            .await?;

        if !gate_accepts(&gate) || memory.is_empty() {
            let topic = self
                .llm
                .classify(&prompts::topic_extraction_prompt(&transcript), user_message)
                .await?;
            tracing::debug!(
                target: "engrammer::pipeline",
                tenant = %self.tenant_id,
                session = %session_id,
                topic = %topic,
                "topic switch"
            );

            match self.cascade.search(&prompts::topic_query(&topic), TOP_K).await {
                Some(retrieved) => {
                    self.working_memory.set(&self.tenant_id, session_id, retrieved.clone());
                    memory = retrieved;
                }
                // Both backends empty: fixed reply, working memory untouched.
                None => {
                    return Ok(self.reply(session_id, prompts::QUIZ_NO_CONTEXT_REPLY.to_string()));
                }
            }
        }

        let transcript = render_transcript(
            &self.conversations.get(&self.tenant_id, session_id),
            Role::System,
        );
        let response = self
            .llm
            .classify(&prompts::quiz_instructions(&memory, &transcript), user_message)
            .await?;

        Ok(self.reply(session_id, response))
    }

    async fn end_conversation(&self, session_id: &str) -> Result<String> {
        self.conversations.clear(&self.tenant_id, session_id);
        self.working_memory.clear(&self.tenant_id, session_id);
        Ok(prompts::SESSION_RESET_REPLY.to_string())
    }
}
