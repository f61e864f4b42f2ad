//! Domain error types

use thiserror::Error;

/// Domain-level errors.
///
/// These are programmer errors: they are raised before any backend session
/// is opened and are never routed through the failure classifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid agent config '{agent}': {reason}")]
    InvalidConfig { agent: String, reason: String },

    #[error("Invalid capability pattern '{pattern}': {reason}")]
    InvalidCapability { pattern: String, reason: String },
}

impl DomainError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        DomainError::InvalidRequest(reason.into())
    }

    /// Check if this error was caused by a malformed execution request
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, DomainError::InvalidRequest(_))
    }
}
