//! Recall pipeline: answer questions about stored memories by running the
//! retrieval cascade directly on the latest user message. No gate, no
//! working memory.

use super::Pipeline;
use crate::conversation::ConversationLog;
use crate::error::Result;
use crate::prompts;
use crate::retrieval::RetrievalCascade;
use crate::shared::{Role, Turn, TurnContent};
use async_trait::async_trait;
use std::sync::Arc;

const TOP_K: usize = 5;

pub struct RecallPipeline {
    tenant_id: String,
    conversations: Arc<ConversationLog>,
    cascade: RetrievalCascade,
}

impl RecallPipeline {
    pub fn new(
        tenant_id: String,
        conversations: Arc<ConversationLog>,
        cascade: RetrievalCascade,
    ) -> Self {
        Self {
            tenant_id,
            conversations,
            cascade,
        }
    }
}

#[async_trait]
impl Pipeline for RecallPipeline {
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

        let answer = self
            .cascade
            .search(user_message, TOP_K)
            .await
            .unwrap_or_else(|| prompts::RECALL_NO_CONTEXT_REPLY.to_string());

        self.conversations.append(
            &self.tenant_id,
            session_id,
            Role::Assistant,
            TurnContent::Text(answer.clone()),
        );
        Ok(answer)
    }

    async fn end_conversation(&self, session_id: &str) -> Result<String> {
        self.conversations.clear(&self.tenant_id, session_id);
        Ok(prompts::SESSION_RESET_REPLY.to_string())
    }
}
