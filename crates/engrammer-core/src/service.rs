//! Service facade consumed by the HTTP layer: the four exposed operations.

use crate::error::Result;
use crate::pipeline_registry::{PipelineDescriptor, PipelineRegistry};
use crate::shared::Turn;
use crate::tenancy::{RegisterTenant, TenantRecord, TenantResourceRegistry};
use std::sync::Arc;

/// One constructed instance per process; every collaborator comes in by
/// handle and the pipeline table is frozen after wiring.
pub struct ChatService {
    pipelines: PipelineRegistry,
    tenants: Arc<TenantResourceRegistry>,
}

impl ChatService {
    pub fn new(pipelines: PipelineRegistry, tenants: Arc<TenantResourceRegistry>) -> Self {
        Self { pipelines, tenants }
    }

    /// Routes one chat turn. Pipeline resolution happens before anything
    /// touches the conversation log, so an unknown pipeline id leaves no
    /// trace.
    pub async fn invoke_turn(
        &self,
        tenant_id: &str,
        pipeline_id: &str,
        session_id: &str,
        user_message: &str,
        history: &[Turn],
    ) -> Result<String> {
        let entry = self.pipelines.get(pipeline_id)?;
        let pipeline = (entry.constructor)(tenant_id.to_string()).await?;
        pipeline.invoke(session_id, user_message, history).await
    }

    /// Explicitly terminates the session's current topic.
    pub async fn end_conversation(
        &self,
        tenant_id: &str,
        pipeline_id: &str,
        session_id: &str,
    ) -> Result<String> {
        let entry = self.pipelines.get(pipeline_id)?;
        let pipeline = (entry.constructor)(tenant_id.to_string()).await?;
        pipeline.end_conversation(session_id).await
    }

    pub fn list_pipelines(&self) -> Vec<PipelineDescriptor> {
        self.pipelines.list()
    }

    pub async fn register_tenant(&self, req: RegisterTenant) -> Result<TenantRecord> {
        self.tenants.register(req).await
    }

    /// Best-effort close of every cached graph connection; call at
    /// process shutdown.
    pub async fn shutdown(&self) {
        self.tenants.close_all().await;
    }
}
