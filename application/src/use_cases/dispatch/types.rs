//! Type definitions for the DispatchAgent use case.

use crate::ports::trace_sink::TraceSink;
use crate::registry::RegistryError;
use fleet_domain::{Classification, DomainError, ExecutionResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop a dispatch before any execution result exists
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    InvalidRequest(#[from] DomainError),
}

/// Input for the DispatchAgent use case
#[derive(Clone)]
pub struct DispatchInput {
    pub agent: String,
    pub prompt: String,
    pub trace_sink: Option<Arc<dyn TraceSink>>,
}

impl DispatchInput {
    pub fn new(agent: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            prompt: prompt.into(),
            trace_sink: None,
        }
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }
}

impl fmt::Debug for DispatchInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchInput")
            .field("agent", &self.agent)
            .field("prompt", &self.prompt)
            .field("trace_sink", &self.trace_sink.is_some())
            .finish()
    }
}

/// What the dispatch loop concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchDecision {
    Succeeded,
    /// Backoff too long to wait inline; the caller should re-dispatch later.
    RetryLater(Duration),
    Escalate,
    PermanentFailure,
    /// Retries were still allowed but `max_attempts` ran out.
    AttemptsExhausted,
}

impl DispatchDecision {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchDecision::Succeeded)
    }
}

impl fmt::Display for DispatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchDecision::Succeeded => write!(f, "succeeded"),
            DispatchDecision::RetryLater(delay) => {
                write!(f, "retry later (in {}s)", delay.as_secs())
            }
            DispatchDecision::Escalate => write!(f, "escalate"),
            DispatchDecision::PermanentFailure => write!(f, "permanent failure"),
            DispatchDecision::AttemptsExhausted => write!(f, "attempts exhausted"),
        }
    }
}

/// Output from the DispatchAgent use case
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub agent: String,
    /// Result of the last attempt.
    pub result: ExecutionResult,
    /// Classification of the last attempt, when it failed.
    pub classification: Option<Classification>,
    pub attempts: u32,
    pub decision: DispatchDecision,
}
