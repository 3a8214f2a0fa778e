//! engrammer-core: multi-tenant conversational orchestration.
//!
//! Routes chat turns through retrieval-augmented pipelines, each backed by a
//! per-tenant graph database. The core owns session state (conversation log,
//! working memory), the tenant resource registry with its one-connection-per-
//! tenant cache, and the pipeline dispatch table; language model, vision,
//! retrieval, and graph-ingest services are consumed as collaborators.

mod config;
mod conversation;
mod error;
mod graph;
mod llm;
mod pipeline_registry;
pub mod pipelines;
pub mod prompts;
mod retrieval;
mod service;
mod shared;
mod tenancy;
mod vision;
mod working_memory;

pub use config::CoreConfig;
pub use conversation::ConversationLog;
pub use error::{Error, Result};
pub use graph::{GraphConnection, GraphConnector, Neo4jConnection, Neo4jConnector};
pub use llm::{ChatBridge, LanguageModel};
pub use pipeline_registry::{
    PipelineConstructor, PipelineDescriptor, PipelineRegistry, RegisteredPipeline,
};
pub use pipelines::{
    default_registry, ActivityCatalog, ActivityQuestion, CapturePipeline, Pipeline, PipelineDeps,
    QuizPipeline, RecallPipeline, StudyPipeline,
};
pub use retrieval::{
    IngestFactory, MemoryIngest, RetrievalCascade, Retriever, RetrieverFactory,
};
pub use service::ChatService;
pub use shared::{last_user_turn, render_transcript, ContentPart, Role, Turn, TurnContent};
pub use tenancy::{
    ProvisionedEndpoint, Provisioner, RegisterTenant, TenantCredentials, TenantRecord,
    TenantResourceRegistry, TenantStore,
};
pub use vision::{OllamaVision, VisionService};
pub use working_memory::WorkingMemory;
