//! Retrieval and graph-ingest collaborator boundaries.
//!
//! The retrieval implementations themselves (vector index, graph traversal,
//! RAG prompt) live outside this core. Pipelines only see an ordered list of
//! strategies tried until one yields a non-empty answer.

use crate::error::Result;
use crate::graph::GraphConnection;
use async_trait::async_trait;
use std::sync::Arc;

/// One retrieval backend: returns a text answer or nothing.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Option<String>>;
}

/// Side-effecting extraction-and-write capability: persists a summarized
/// memory into the tenant's graph.
#[async_trait]
pub trait MemoryIngest: Send + Sync {
    async fn ingest(&self, text: &str) -> Result<()>;
}

/// Builds per-tenant retrievers bound to a cached graph connection.
pub trait RetrieverFactory: Send + Sync {
    /// Graph-aware retrieval (entity-hop context).
    fn graph(&self, conn: &Arc<dyn GraphConnection>) -> Arc<dyn Retriever>;
    /// Plain vector-similarity retrieval.
    fn vector(&self, conn: &Arc<dyn GraphConnection>) -> Arc<dyn Retriever>;
}

/// Builds the per-tenant graph ingest collaborator.
pub trait IngestFactory: Send + Sync {
    fn for_connection(&self, conn: &Arc<dyn GraphConnection>) -> Arc<dyn MemoryIngest>;
}

/// Ordered retrieval strategies tried in sequence until one yields a
/// non-empty result. Strategy failures count as empty: the cascade moves on
/// rather than surfacing an error for "no results".
pub struct RetrievalCascade {
    strategies: Vec<Arc<dyn Retriever>>,
}

impl RetrievalCascade {
    pub fn new(strategies: Vec<Arc<dyn Retriever>>) -> Self {
        Self { strategies }
    }

    /// First non-empty answer, or None when every backend comes up empty.
    pub async fn search(&self, query: &str, top_k: usize) -> Option<String> {
        for (idx, retriever) in self.strategies.iter().enumerate() {
            match retriever.search(query, top_k).await {
                Ok(Some(answer)) if !answer.trim().is_empty() => {
                    return Some(answer.trim().to_string());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "engrammer::pipeline",
                        strategy = idx,
                        "retrieval strategy failed, trying next: {e}"
                    );
                }
            }
        }
        None
    }
}
