//! Inference backend port
//!
//! Defines how the execution engine talks to the model backend: open one
//! session per run, then pull events until the stream ends.

use async_trait::async_trait;
use fleet_domain::{BackendEvent, CapabilityScope, RawFailure};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a backend or one of its sessions.
///
/// Every variant maps to a [`RawFailure`] so the classifier sees the fault as
/// the backend reported it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Malformed event: {0}")]
    Malformed(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolProvider { tool: String, message: String },

    #[error("Request rejected: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl From<&BackendError> for RawFailure {
    fn from(error: &BackendError) -> Self {
        match error {
            BackendError::Connection(message) => RawFailure::transport(message.clone()),
            BackendError::TransportClosed => RawFailure::transport("transport closed"),
            BackendError::Session(message) | BackendError::Other(message) => {
                RawFailure::backend(message.clone())
            }
            BackendError::Malformed(message) => {
                RawFailure::backend(format!("malformed event: {}", message))
            }
            BackendError::ToolProvider { tool, message } => {
                RawFailure::tool(tool.clone(), message.clone())
            }
            BackendError::Rejected { status, message } => {
                let raw = RawFailure::backend(message.clone());
                match status {
                    Some(code) => raw.with_status(*code),
                    None => raw,
                }
            }
        }
    }
}

/// Everything a backend needs to open a scoped session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub prompt: String,
    pub capabilities: CapabilityScope,
    pub working_root: PathBuf,
    pub max_turns: u32,
    /// Backend model selector. `None` leaves the choice to the backend.
    pub model_id: Option<String>,
}

/// Factory for backend sessions.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Open one session scoped to the spec's capabilities, root and turn budget.
    async fn open_session(&self, spec: &SessionSpec) -> Result<Box<dyn BackendSession>, BackendError>;

    /// Name used in logs and the status surface.
    fn name(&self) -> &str {
        "backend"
    }
}

/// One live backend session.
///
/// `next_event` yields events in causal order and `Ok(None)` once the stream
/// is exhausted. After an error or `None` the session must not be polled again.
#[async_trait]
pub trait BackendSession: Send {
    async fn next_event(&mut self) -> Result<Option<BackendEvent>, BackendError>;

    /// Abort the session and release its resources. Must be idempotent.
    async fn cancel(&mut self);
}
