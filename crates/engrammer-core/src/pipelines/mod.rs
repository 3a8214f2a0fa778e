//! Pipeline runtimes: the per-turn state machines.
//!
//! Each pipeline is a stateful object bound to one tenant at construction
//! (acquiring the cached graph connection through the tenant resource
//! registry). Session state is entirely encoded in the conversation log
//! (history + preamble presence) and the working-memory slot; each turn
//! infers its state from those at entry.

mod capture;
mod quiz;
mod recall;
mod study;

pub use capture::CapturePipeline;
pub use quiz::QuizPipeline;
pub use recall::RecallPipeline;
pub use study::StudyPipeline;

use crate::conversation::ConversationLog;
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::pipeline_registry::{PipelineConstructor, PipelineRegistry, RegisteredPipeline};
use crate::retrieval::{IngestFactory, RetrievalCascade, RetrieverFactory};
use crate::shared::Turn;
use crate::tenancy::TenantResourceRegistry;
use crate::vision::VisionService;
use crate::working_memory::WorkingMemory;
use async_trait::async_trait;
use std::sync::Arc;

/// A turn-processing pipeline bound to one tenant.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Process one inbound turn and return the assistant's reply.
    async fn invoke(&self, session_id: &str, user_message: &str, history: &[Turn])
        -> Result<String>;

    /// Explicitly terminate the session's current topic. Save-oriented
    /// pipelines summarize and persist; others just reset.
    async fn end_conversation(&self, session_id: &str) -> Result<String>;
}

/// One question of a static learning activity, consumed at preamble time by
/// the study pipeline.
#[derive(Debug, Clone)]
pub struct ActivityQuestion {
    pub context: String,
    pub question: String,
    pub expected_answer: String,
}

/// Static quiz/activity content, loaded and owned outside this core.
pub trait ActivityCatalog: Send + Sync {
    fn question(&self, activity_id: &str, question_id: &str) -> Option<ActivityQuestion>;
}

/// Everything pipeline constructors need, passed by handle (no process-wide
/// singletons).
pub struct PipelineDeps {
    pub tenants: Arc<TenantResourceRegistry>,
    pub conversations: Arc<ConversationLog>,
    pub working_memory: Arc<WorkingMemory>,
    pub llm: Arc<dyn LanguageModel>,
    /// Absent configuration disables multimodal enrichment entirely.
    pub vision: Option<Arc<dyn VisionService>>,
    pub retrievers: Arc<dyn RetrieverFactory>,
    pub ingest: Arc<dyn IngestFactory>,
    pub activities: Arc<dyn ActivityCatalog>,
}

impl PipelineDeps {
    /// Resolves the tenant (UnknownTenant on a miss) and returns its cached
    /// graph connection.
    async fn bind_tenant(&self, tenant_id: &str) -> Result<Arc<dyn crate::graph::GraphConnection>> {
        self.tenants
            .get(tenant_id)?
            .ok_or_else(|| Error::UnknownTenant(tenant_id.to_string()))?;
        self.tenants.get_connection(tenant_id).await
    }
}

/// Builds the closed set of pipelines. Duplicate ids abort wiring.
pub fn default_registry(deps: &Arc<PipelineDeps>) -> Result<PipelineRegistry> {
    let mut registry = PipelineRegistry::new();

    registry.register(RegisteredPipeline {
        id: "memory_capture".to_string(),
        name: "Engrammer – Capture Memory".to_string(),
        description: "Chats to enrich a memory, then extracts it into the tenant's graph on termination."
            .to_string(),
        constructor: capture_constructor(deps.clone()),
    })?;

    registry.register(RegisteredPipeline {
        id: "memory_recall".to_string(),
        name: "Engrammer – Recall Memory".to_string(),
        description: "Answers questions about stored memories with graph-then-vector retrieval."
            .to_string(),
        constructor: recall_constructor(deps.clone()),
    })?;

    registry.register(RegisteredPipeline {
        id: "memory_quiz".to_string(),
        name: "Engrammer – Memory Quiz".to_string(),
        description: "Asks guided questions about one memory held in working memory, switching topics on demand."
            .to_string(),
        constructor: quiz_constructor(deps.clone()),
    })?;

    registry.register(RegisteredPipeline {
        id: "study_session".to_string(),
        name: "Engrammer – Study Session".to_string(),
        description: "Guides a student through an activity question with vector-retrieved course context."
            .to_string(),
        constructor: study_constructor(deps.clone()),
    })?;

    Ok(registry)
}

fn capture_constructor(deps: Arc<PipelineDeps>) -> PipelineConstructor {
    Arc::new(move |tenant_id: String| {
        let deps = deps.clone();
        Box::pin(async move {
            let conn = deps.bind_tenant(&tenant_id).await?;
            let ingest = deps.ingest.for_connection(&conn);
            Ok(Arc::new(CapturePipeline::new(
                tenant_id,
                deps.conversations.clone(),
                deps.llm.clone(),
                deps.vision.clone(),
                ingest,
            )) as Arc<dyn Pipeline>)
        })
    })
}

fn recall_constructor(deps: Arc<PipelineDeps>) -> PipelineConstructor {
    Arc::new(move |tenant_id: String| {
        let deps = deps.clone();
        Box::pin(async move {
            let conn = deps.bind_tenant(&tenant_id).await?;
            let cascade = RetrievalCascade::new(vec![
                deps.retrievers.graph(&conn),
                deps.retrievers.vector(&conn),
            ]);
            Ok(Arc::new(RecallPipeline::new(
                tenant_id,
                deps.conversations.clone(),
                cascade,
            )) as Arc<dyn Pipeline>)
        })
    })
}

fn quiz_constructor(deps: Arc<PipelineDeps>) -> PipelineConstructor {
    Arc::new(move |tenant_id: String| {
        let deps = deps.clone();
        Box::pin(async move {
            let conn = deps.bind_tenant(&tenant_id).await?;
            let cascade = RetrievalCascade::new(vec![
                deps.retrievers.graph(&conn),
                deps.retrievers.vector(&conn),
            ]);
            Ok(Arc::new(QuizPipeline::new(
                tenant_id,
                deps.conversations.clone(),
                deps.working_memory.clone(),
                deps.llm.clone(),
                cascade,
            )) as Arc<dyn Pipeline>)
        })
    })
}

fn study_constructor(deps: Arc<PipelineDeps>) -> PipelineConstructor {
    Arc::new(move |tenant_id: String| {
        let deps = deps.clone();
        Box::pin(async move {
            let conn = deps.bind_tenant(&tenant_id).await?;
            let vector = deps.retrievers.vector(&conn);
            Ok(Arc::new(StudyPipeline::new(
                tenant_id,
                deps.conversations.clone(),
                deps.llm.clone(),
                vector,
                deps.activities.clone(),
            )) as Arc<dyn Pipeline>)
        })
    })
}
