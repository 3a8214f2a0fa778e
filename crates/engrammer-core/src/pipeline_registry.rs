//! Static dispatch table mapping pipeline ids to tenant-binding
//! constructors. Built once at startup wiring and read-only afterwards.

use crate::error::{Error, Result};
use crate::pipelines::Pipeline;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Async constructor binding a pipeline instance to one tenant.
pub type PipelineConstructor =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<Arc<dyn Pipeline>>> + Send + Sync>;

/// One registry entry.
#[derive(Clone)]
pub struct RegisteredPipeline {
    pub id: String,
    pub name: String,
    pub description: String,
    pub constructor: PipelineConstructor,
}

impl std::fmt::Debug for RegisteredPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPipeline")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Public listing shape (id/name/description only).
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Identifier-unique pipeline table. Duplicate registration is a fatal
/// configuration error at startup, not a runtime condition.
#[derive(Default)]
pub struct PipelineRegistry {
    entries: HashMap<String, RegisteredPipeline>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: RegisteredPipeline) -> Result<()> {
        if self.entries.contains_key(&entry.id) {
            return Err(Error::DuplicateId(entry.id));
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    pub fn get(&self, pipeline_id: &str) -> Result<&RegisteredPipeline> {
        self.entries
            .get(pipeline_id)
            .ok_or_else(|| Error::UnknownPipeline(pipeline_id.to_string()))
    }

    /// All entries, sorted by id for stable listing output.
    pub fn list(&self) -> Vec<PipelineDescriptor> {
        let mut out: Vec<PipelineDescriptor> = self
            .entries
            .values()
            .map(|e| PipelineDescriptor {
                id: e.id.clone(),
                name: e.name.clone(),
                description: e.description.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
