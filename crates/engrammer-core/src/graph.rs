//! Backing graph database boundary.
//!
//! The tenant resource registry only needs open/close; everything else the
//! retrieval and ingest collaborators do with a connection is opaque to the
//! core. `Neo4jConnector` is the production implementation over `neo4rs`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// A live connection to one tenant's graph database.
pub trait GraphConnection: Send + Sync {
    /// Best-effort close. The registry ignores failures on evict
    /// (close-err-ignored policy); other callers may propagate.
    fn close(&self) -> Result<()>;

    /// Downcast hook for collaborator factories that need the concrete
    /// driver handle.
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn GraphConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphConnection")
    }
}

/// Opens connections from a credential triple.
#[async_trait]
pub trait GraphConnector: Send + Sync {
    async fn open(&self, uri: &str, user: &str, secret: &str) -> Result<Arc<dyn GraphConnection>>;
}

/// Connection wrapper around a `neo4rs` graph handle.
pub struct Neo4jConnection {
    graph: neo4rs::Graph,
}

impl Neo4jConnection {
    pub fn graph(&self) -> &neo4rs::Graph {
        &self.graph
    }
}

impl GraphConnection for Neo4jConnection {
    fn close(&self) -> Result<()> {
        // neo4rs tears the connection pool down on drop; nothing to flush.
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Production connector: Bolt via `neo4rs`.
#[derive(Default)]
pub struct Neo4jConnector;

#[async_trait]
impl GraphConnector for Neo4jConnector {
    async fn open(&self, uri: &str, user: &str, secret: &str) -> Result<Arc<dyn GraphConnection>> {
        let graph = neo4rs::Graph::new(uri, user, secret)
            .await
            .map_err(|e| Error::Connectivity(format!("graph open {uri}: {e}")))?;
        Ok(Arc::new(Neo4jConnection { graph }))
    }
}
