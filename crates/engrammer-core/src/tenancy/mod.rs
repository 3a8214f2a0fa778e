//! Tenant resource registry: durable tenant records plus a cache of one
//! live graph connection per tenant.
//!
//! Invariants:
//! - at most one cached connection per tenant at any time;
//! - any credential-tuple change evicts (and best-effort closes) the
//!   cached connection;
//! - cache reads/writes are serialized by a single mutex scoped to this
//!   registry, held only around lookup/insert/evict — never around the
//!   connection's actual use or across an open;
//! - a tenant's first open is serialized by a per-tenant gate, so one
//!   tenant's slow open never delays another tenant's cache hit.

mod store;

pub use store::{TenantRecord, TenantStore};

use crate::error::{Error, Result};
use crate::graph::{GraphConnection, GraphConnector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Endpoint and credential returned by the container provisioner.
#[derive(Debug, Clone)]
pub struct ProvisionedEndpoint {
    pub uri: String,
    pub user: String,
    pub secret: String,
}

/// Ensures an isolated database instance exists for a tenant. Idempotent
/// across repeated calls.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn ensure(
        &self,
        tenant_id: &str,
        existing_secret: Option<&str>,
    ) -> Result<ProvisionedEndpoint>;
}

/// Caller-supplied credential triple. Blank fields mean "provision for me".
#[derive(Debug, Clone, Default)]
pub struct TenantCredentials {
    pub uri: String,
    pub user: String,
    pub secret: String,
}

impl TenantCredentials {
    fn is_blank(&self) -> bool {
        self.uri.trim().is_empty() || self.user.trim().is_empty() || self.secret.trim().is_empty()
    }
}

/// Registration payload for [`TenantResourceRegistry::register`].
#[derive(Debug, Clone, Default)]
pub struct RegisterTenant {
    pub tenant_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub credentials: Option<TenantCredentials>,
}

/// Owns the tenant_id → credentials mapping and lazily materializes one
/// live graph connection per tenant.
pub struct TenantResourceRegistry {
    store: TenantStore,
    connector: Arc<dyn GraphConnector>,
    provisioner: Option<Arc<dyn Provisioner>>,
    connections: Mutex<HashMap<String, Arc<dyn GraphConnection>>>,
    open_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TenantResourceRegistry {
    pub fn new(
        store: TenantStore,
        connector: Arc<dyn GraphConnector>,
        provisioner: Option<Arc<dyn Provisioner>>,
    ) -> Self {
        Self {
            store,
            connector,
            provisioner,
            connections: Mutex::new(HashMap::new()),
            open_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Creates or updates a tenant record. Blank credentials trigger the
    /// container provisioner (preserving any previously generated secret);
    /// a credential change evicts the cached connection.
    pub async fn register(&self, req: RegisterTenant) -> Result<TenantRecord> {
        let existing = self.store.get(&req.tenant_id)?;

        let credentials = match req.credentials {
            Some(c) if !c.is_blank() => c,
            _ => {
                let provisioner = self.provisioner.as_ref().ok_or_else(|| {
                    Error::Config(
                        "blank credentials and auto-provisioning is disabled".to_string(),
                    )
                })?;
                let prior_secret = existing.as_ref().map(|r| r.graph_secret.as_str());
                let endpoint = provisioner.ensure(&req.tenant_id, prior_secret).await?;
                tracing::info!(
                    target: "engrammer::tenancy",
                    tenant = %req.tenant_id,
                    uri = %endpoint.uri,
                    "provisioned graph endpoint"
                );
                TenantCredentials {
                    uri: endpoint.uri,
                    user: endpoint.user,
                    secret: endpoint.secret,
                }
            }
        };

        let now = store::timestamp_ms();
        let record = match existing {
            Some(old) => {
                let changed = old.credential_tuple()
                    != (
                        credentials.uri.clone(),
                        credentials.user.clone(),
                        credentials.secret.clone(),
                    );
                let record = TenantRecord {
                    tenant_id: old.tenant_id.clone(),
                    name: non_blank(req.name).or(old.name),
                    email: non_blank(req.email).or(old.email),
                    graph_uri: credentials.uri,
                    graph_user: credentials.user,
                    graph_secret: credentials.secret,
                    created_at_ms: old.created_at_ms,
                    updated_at_ms: now,
                };
                if changed {
                    self.evict(&record.tenant_id).await;
                }
                record
            }
            None => TenantRecord {
                tenant_id: req.tenant_id,
                name: non_blank(req.name),
                email: non_blank(req.email),
                graph_uri: credentials.uri,
                graph_user: credentials.user,
                graph_secret: credentials.secret,
                created_at_ms: now,
                updated_at_ms: now,
            },
        };

        self.store.upsert(&record)?;
        Ok(record)
    }

    /// Pure read of the durable record.
    pub fn get(&self, tenant_id: &str) -> Result<Option<TenantRecord>> {
        self.store.get(tenant_id)
    }

    /// Cached connection for the tenant, opening one on first use.
    /// Concurrent callers for the same tenant observe at most one live
    /// connection object; opens for different tenants do not serialize.
    pub async fn get_connection(&self, tenant_id: &str) -> Result<Arc<dyn GraphConnection>> {
        if let Some(conn) = self.connections.lock().await.get(tenant_id) {
            return Ok(conn.clone());
        }

        let gate = self.open_gate(tenant_id).await;
        let _opening = gate.lock().await;

        // A racing caller may have filled the slot while we waited.
        if let Some(conn) = self.connections.lock().await.get(tenant_id) {
            return Ok(conn.clone());
        }

        let record = self
            .store
            .get(tenant_id)?
            .ok_or_else(|| Error::UnknownTenant(tenant_id.to_string()))?;
        let conn = self
            .connector
            .open(&record.graph_uri, &record.graph_user, &record.graph_secret)
            .await?;
        self.connections
            .lock()
            .await
            .insert(tenant_id.to_string(), conn.clone());
        tracing::info!(target: "engrammer::tenancy", tenant = %tenant_id, "opened graph connection");
        Ok(conn)
    }

    async fn open_gate(&self, tenant_id: &str) -> Arc<Mutex<()>> {
        self.open_gates
            .lock()
            .await
            .entry(tenant_id.to_string())
            .or_default()
            .clone()
    }

    /// Removes and best-effort closes the cached connection. Close failures
    /// are logged and swallowed (close-err-ignored policy). Takes the
    /// tenant's open gate first, so an in-flight open cannot re-insert a
    /// connection built from the old credentials.
    async fn evict(&self, tenant_id: &str) {
        let gate = self.open_gate(tenant_id).await;
        let _opening = gate.lock().await;
        let removed = self.connections.lock().await.remove(tenant_id);
        if let Some(conn) = removed {
            if let Err(e) = conn.close() {
                tracing::debug!(
                    target: "engrammer::tenancy",
                    tenant = %tenant_id,
                    "ignoring connection close failure on evict: {e}"
                );
            }
        }
    }

    /// Best-effort close of every cached connection; used at shutdown.
    pub async fn close_all(&self) {
        let mut cache = self.connections.lock().await;
        for (tenant_id, conn) in cache.drain() {
            if let Err(e) = conn.close() {
                tracing::debug!(
                    target: "engrammer::tenancy",
                    tenant = %tenant_id,
                    "ignoring connection close failure on shutdown: {e}"
                );
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
