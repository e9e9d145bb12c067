// src/domain/errors.rs
use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Decision service error: {0}")]
    Decision(#[from] DecisionError),

    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

/// Failure of a single exchange call. Market-data callers default the
/// field and move on; trading callers turn it into a failure outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Anything that goes wrong talking to the decision service. Never leaves
/// the consultant: it is logged and replaced by the emergency decision.
#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decision service timed out after {0}s")]
    Timeout(u64),

    #[error("Decision service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion envelope: {0}")]
    Envelope(String),

    #[error("Malformed decision document: {0}")]
    Document(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("No usable market data across {requested} instruments")]
    Incomplete { requested: usize },
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Cycle-level failures caught at the orchestrator boundary
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Snapshot incomplete: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Cycle task panicked: {0}")]
    Panicked(String),

    #[error("Cycle task cancelled")]
    Cancelled,

    #[error("Failed to record cycle: {0}")]
    Audit(#[from] AuditError),
}

/// Readable text from a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

pub type AppResult<T> = Result<T, AppError>;
pub type ExchangeResult<T> = Result<T, ExchangeError>;
pub type DecisionResult<T> = Result<T, DecisionError>;
pub type AuditResult<T> = Result<T, AuditError>;
pub type CycleResult<T> = Result<T, CycleError>;
