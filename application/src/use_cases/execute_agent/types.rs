//! Type definitions for the ExecuteAgent use case.

use crate::ports::inference_backend::SessionSpec;
use crate::ports::trace_sink::TraceSink;
use fleet_domain::{AgentConfig, CapabilityScope, DomainError};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Input for one execution: everything the engine needs, nothing more.
///
/// Built from an [`AgentConfig`] plus task text by the dispatch shell, or
/// directly for ad hoc runs.
#[derive(Clone)]
pub struct ExecutionRequest {
    /// Registry name, when the request came from a registered agent.
    pub agent: Option<String>,
    pub prompt: String,
    pub capabilities: CapabilityScope,
    pub working_root: PathBuf,
    pub max_turns: u32,
    pub timeout_seconds: u64,
    pub model_id: Option<String>,
    pub trace_sink: Option<Arc<dyn TraceSink>>,
}

impl ExecutionRequest {
    pub fn for_agent(config: &AgentConfig, prompt: impl Into<String>) -> Self {
        Self {
            agent: Some(config.name.clone()),
            prompt: prompt.into(),
            capabilities: config.capabilities.clone(),
            working_root: config.working_root.clone(),
            max_turns: config.max_turns,
            timeout_seconds: config.timeout_seconds,
            model_id: Some(config.model_id.clone()),
            trace_sink: None,
        }
    }

    pub fn ad_hoc(
        prompt: impl Into<String>,
        capabilities: CapabilityScope,
        working_root: impl Into<PathBuf>,
        max_turns: u32,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            agent: None,
            prompt: prompt.into(),
            capabilities,
            working_root: working_root.into(),
            max_turns,
            timeout_seconds,
            model_id: None,
            trace_sink: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Name for logs and progress output.
    pub fn label(&self) -> &str {
        self.agent.as_deref().unwrap_or("ad-hoc")
    }

    /// Reject requests that can never run. These are caller bugs, not
    /// runtime failures, and are never classified.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.prompt.trim().is_empty() {
            return Err(DomainError::invalid_request("prompt must not be empty"));
        }
        if self.max_turns == 0 {
            return Err(DomainError::invalid_request("max_turns must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(DomainError::invalid_request(
                "timeout_seconds must be at least 1",
            ));
        }
        if self.working_root.as_os_str().is_empty() {
            return Err(DomainError::invalid_request("working_root must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn session_spec(&self) -> SessionSpec {
        SessionSpec {
            prompt: self.prompt.clone(),
            capabilities: self.capabilities.clone(),
            working_root: self.working_root.clone(),
            max_turns: self.max_turns,
            model_id: self.model_id.clone(),
        }
    }
}

impl fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("agent", &self.agent)
            .field("prompt", &self.prompt)
            .field("capabilities", &self.capabilities)
            .field("working_root", &self.working_root)
            .field("max_turns", &self.max_turns)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("model_id", &self.model_id)
            .field("trace_sink", &self.trace_sink.is_some())
            .finish()
    }
}
