//! Error types for the Engrammer core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the orchestration core.
///
/// `EmptyRetrieval` is deliberately absent: an empty cascade is a defined
/// branch of the pipeline state machine, answered with a fixed message.
#[derive(Error, Debug)]
pub enum Error {
    /// No tenant row exists for the given id. Client-facing "not found".
    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    /// No pipeline registered under the given id. Client-facing "not found".
    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    /// A pipeline id was registered twice. Fatal at startup wiring.
    #[error("Pipeline id already registered: {0}")]
    DuplicateId(String),

    /// Backing database, container runtime, or external service unreachable.
    /// Retryable from the caller's perspective; never swallowed here except
    /// on connection-close-at-evict and optional vision enrichment.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Session id does not decompose into the composite key an
    /// identifier-bearing pipeline expects. Client-facing "bad request".
    #[error("Malformed session id: {0}")]
    MalformedSessionId(String),

    /// The activity catalog has no entry for the requested question.
    #[error("Unknown question {question_id} for activity {activity_id}")]
    UnknownQuestion {
        activity_id: String,
        question_id: String,
    },

    /// Misconfiguration detected at startup or first use (e.g. blank
    /// credentials with auto-provisioning disabled).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tenant store (SQLite) failure.
    #[error("Tenant store error: {0}")]
    Store(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Connectivity(err.to_string())
    }
}
