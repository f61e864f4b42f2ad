//! Raw, unclassified failure as reported by the backend, transport, or engine.

use crate::execution::result::ExecutionResult;
use crate::failure::category::FailureCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a fault originated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FailureSource {
    /// The inference backend reported the fault.
    Backend,
    /// The connection to the backend failed.
    Transport,
    /// A specific tool invocation reported an error payload.
    Tool { name: String },
    /// The engine's wall-clock deadline elapsed.
    Deadline,
}

/// The fault as raised, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFailure {
    #[serde(flatten)]
    pub source: FailureSource,
    pub message: String,
    /// HTTP-style status, when the backend surfaced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl RawFailure {
    pub fn new(source: FailureSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(FailureSource::Backend, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureSource::Transport, message)
    }

    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureSource::Tool { name: name.into() }, message)
    }

    pub fn deadline(timeout_seconds: u64) -> Self {
        Self::new(
            FailureSource::Deadline,
            format!("execution exceeded deadline of {}s", timeout_seconds),
        )
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn tool_name(&self) -> Option<&str> {
        match &self.source {
            FailureSource::Tool { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_deadline(&self) -> bool {
        matches!(self.source, FailureSource::Deadline)
    }

    /// One-line summary including status and tool attribution.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        if let Some(status) = self.status_code {
            summary.push_str(&format!("[{}] ", status));
        }
        if let Some(tool) = self.tool_name() {
            summary.push_str(&format!("tool '{}': ", tool));
        }
        summary.push_str(self.message.lines().next().unwrap_or(""));
        summary
    }

    /// A run that "succeeded" without producing any text or tool activity is
    /// treated as an empty backend response.
    ///
    /// Returns the raw failure to classify, or `None` if the result is a real
    /// failure already or carries output.
    pub fn anomaly_in(result: &ExecutionResult) -> Option<RawFailure> {
        if !result.succeeded {
            return None;
        }
        if result.response_text.trim().is_empty() && result.tool_invocation_count == 0 {
            return Some(RawFailure::backend(
                "empty response: backend completed without output",
            ));
        }
        None
    }

    /// The raw failure behind a failed result, if any.
    pub fn of(result: &ExecutionResult) -> Option<&RawFailure> {
        result.failure.as_ref().map(|f| &f.detail)
    }

    /// Category implied by the source alone, when it is unambiguous.
    pub(crate) fn implied_category(&self) -> Option<FailureCategory> {
        match self.source {
            FailureSource::Deadline => Some(FailureCategory::Timeout),
            _ => None,
        }
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
