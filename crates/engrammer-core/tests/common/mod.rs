//! Shared scripted collaborators for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use engrammer_core::{
    ActivityCatalog, ActivityQuestion, ConversationLog, Error, GraphConnection, GraphConnector,
    IngestFactory, LanguageModel, MemoryIngest, PipelineDeps, ProvisionedEndpoint, Provisioner,
    RegisterTenant, Result, Retriever, RetrieverFactory, TenantCredentials,
    TenantResourceRegistry, TenantStore, Turn, VisionService, WorkingMemory,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TENANT: &str = "t1";

// ---------------------------------------------------------------------------
// Graph connector
// ---------------------------------------------------------------------------

pub struct MockConnection {
    pub id: usize,
    pub closed: AtomicBool,
    pub fail_close: bool,
}

impl GraphConnection for MockConnection {
    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(Error::Connectivity("close refused".to_string()));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Counts opened connections; an artificial delay inside `open` widens the
/// window for racing callers.
pub struct CountingConnector {
    pub opens: AtomicUsize,
    pub fail_close: bool,
    delay: std::time::Duration,
}

impl CountingConnector {
    pub fn new() -> Self {
        Self::with_open_delay(std::time::Duration::from_millis(5))
    }

    pub fn with_open_delay(delay: std::time::Duration) -> Self {
        Self {
            opens: AtomicUsize::new(0),
            fail_close: false,
            delay,
        }
    }

    pub fn with_failing_close() -> Self {
        Self {
            fail_close: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl GraphConnector for CountingConnector {
    async fn open(&self, _uri: &str, _user: &str, _secret: &str) -> Result<Arc<dyn GraphConnection>> {
        tokio::time::sleep(self.delay).await;
        let id = self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            id,
            closed: AtomicBool::new(false),
            fail_close: self.fail_close,
        }))
    }
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

/// Returns a stable endpoint; records the prior secret it was handed.
pub struct MockProvisioner {
    pub calls: Mutex<Vec<Option<String>>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    async fn ensure(
        &self,
        _tenant_id: &str,
        existing_secret: Option<&str>,
    ) -> Result<ProvisionedEndpoint> {
        self.calls
            .lock()
            .unwrap()
            .push(existing_secret.map(|s| s.to_string()));
        Ok(ProvisionedEndpoint {
            uri: "bolt://localhost:32771".to_string(),
            user: "neo4j".to_string(),
            secret: existing_secret.unwrap_or("gen-secret-1").to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Language model
// ---------------------------------------------------------------------------

/// Pops scripted classify replies in order ("False" once the script runs
/// dry); `complete` always returns the same reply and records its input.
pub struct ScriptedLlm {
    classify_replies: Mutex<VecDeque<String>>,
    complete_reply: String,
    pub classify_calls: Mutex<Vec<(String, String)>>,
    pub complete_calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedLlm {
    pub fn new(classify_replies: &[&str], complete_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            classify_replies: Mutex::new(
                classify_replies.iter().map(|s| s.to_string()).collect(),
            ),
            complete_reply: complete_reply.to_string(),
            classify_calls: Mutex::new(Vec::new()),
            complete_calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(&self, turns: &[Turn]) -> Result<String> {
        self.complete_calls.lock().unwrap().push(turns.to_vec());
        Ok(self.complete_reply.clone())
    }

    async fn classify(&self, instructions: &str, input: &str) -> Result<String> {
        self.classify_calls
            .lock()
            .unwrap()
            .push((instructions.to_string(), input.to_string()));
        Ok(self
            .classify_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "False".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

pub struct FailingVision;

#[async_trait]
impl VisionService for FailingVision {
    async fn describe(&self, _images: &[String], _instructions: &str) -> Result<String> {
        Err(Error::Connectivity("vision backend down".to_string()))
    }
}

pub struct FixedVision(pub String);

#[async_trait]
impl VisionService for FixedVision {
    async fn describe(&self, _images: &[String], _instructions: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Retrieval / ingest
// ---------------------------------------------------------------------------

pub struct FixedRetriever {
    result: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl FixedRetriever {
    pub fn new(result: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            result: result.map(|s| s.to_string()),
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn search(&self, query: &str, _top_k: usize) -> Result<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.result.clone())
    }
}

pub struct StaticRetrieverFactory {
    pub graph: Arc<FixedRetriever>,
    pub vector: Arc<FixedRetriever>,
}

impl StaticRetrieverFactory {
    pub fn new(graph_result: Option<&str>, vector_result: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            graph: FixedRetriever::new(graph_result),
            vector: FixedRetriever::new(vector_result),
        })
    }
}

impl RetrieverFactory for StaticRetrieverFactory {
    fn graph(&self, _conn: &Arc<dyn GraphConnection>) -> Arc<dyn Retriever> {
        self.graph.clone()
    }

    fn vector(&self, _conn: &Arc<dyn GraphConnection>) -> Arc<dyn Retriever> {
        self.vector.clone()
    }
}

pub struct RecordingIngest {
    pub ingested: Mutex<Vec<String>>,
}

#[async_trait]
impl MemoryIngest for RecordingIngest {
    async fn ingest(&self, text: &str) -> Result<()> {
        self.ingested.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct RecordingIngestFactory {
    pub ingest: Arc<RecordingIngest>,
}

impl RecordingIngestFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ingest: Arc::new(RecordingIngest {
                ingested: Mutex::new(Vec::new()),
            }),
        })
    }
}

impl IngestFactory for RecordingIngestFactory {
    fn for_connection(&self, _conn: &Arc<dyn GraphConnection>) -> Arc<dyn MemoryIngest> {
        self.ingest.clone()
    }
}

// ---------------------------------------------------------------------------
// Activity catalog
// ---------------------------------------------------------------------------

pub struct MapCatalog {
    entries: HashMap<(String, String), ActivityQuestion>,
}

impl MapCatalog {
    pub fn with_question(activity_id: &str, question_id: &str, question: ActivityQuestion) -> Arc<Self> {
        let mut entries = HashMap::new();
        entries.insert((activity_id.to_string(), question_id.to_string()), question);
        Arc::new(Self { entries })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            entries: HashMap::new(),
        })
    }
}

impl ActivityCatalog for MapCatalog {
    fn question(&self, activity_id: &str, question_id: &str) -> Option<ActivityQuestion> {
        self.entries
            .get(&(activity_id.to_string(), question_id.to_string()))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Registry with a tempfile-backed store, a counting connector, and one
/// tenant registered with explicit credentials. Keep the TempDir alive for
/// the duration of the test.
pub async fn registry_with_tenant(
    connector: Arc<CountingConnector>,
) -> (Arc<TenantResourceRegistry>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = TenantStore::new(dir.path().join("tenants.db")).unwrap();
    let registry = Arc::new(TenantResourceRegistry::new(store, connector, None));
    registry
        .register(RegisterTenant {
            tenant_id: TENANT.to_string(),
            name: Some("Tenant One".to_string()),
            email: None,
            credentials: Some(TenantCredentials {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                secret: "pw".to_string(),
            }),
        })
        .await
        .unwrap();
    (registry, dir)
}

pub struct Harness {
    pub deps: Arc<PipelineDeps>,
    pub llm: Arc<ScriptedLlm>,
    pub retrievers: Arc<StaticRetrieverFactory>,
    pub ingest: Arc<RecordingIngestFactory>,
    _dir: tempfile::TempDir,
}

/// Full pipeline dependency set over scripted collaborators.
pub async fn harness(
    llm: Arc<ScriptedLlm>,
    retrievers: Arc<StaticRetrieverFactory>,
    vision: Option<Arc<dyn VisionService>>,
    activities: Arc<MapCatalog>,
) -> Harness {
    let (tenants, dir) = registry_with_tenant(Arc::new(CountingConnector::new())).await;
    let ingest = RecordingIngestFactory::new();
    let deps = Arc::new(PipelineDeps {
        tenants,
        conversations: Arc::new(ConversationLog::new()),
        working_memory: Arc::new(WorkingMemory::new()),
        llm: llm.clone(),
        vision,
        retrievers: retrievers.clone(),
        ingest: ingest.clone(),
        activities,
    });
    Harness {
        deps,
        llm,
        retrievers,
        ingest,
        _dir: dir,
    }
}
