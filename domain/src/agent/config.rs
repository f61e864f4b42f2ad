//! Agent configuration: the immutable identity of one automation agent.
//!
//! [`AgentConfig`] is produced by a single parse-and-validate pass when the
//! registry loads, then shared as `Arc<AgentConfig>`. A running execution
//! holds its own `Arc`, so a registry reload swaps the table without touching
//! configs already handed out.

use super::capability::CapabilityScope;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default turn budget for agents created without one.
pub const DEFAULT_MAX_TURNS: u32 = 10;
/// Default wall-clock budget, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Validated configuration record for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique registry key.
    pub name: String,
    /// Permitted tool-invocation patterns.
    pub capabilities: CapabilityScope,
    /// Filesystem root the agent's tool calls are confined to.
    pub working_root: PathBuf,
    /// Upper bound on inference/tool round-trips.
    pub max_turns: u32,
    /// Wall-clock budget for one run.
    pub timeout_seconds: u64,
    /// Opaque backend model selector.
    pub model_id: String,
    pub enabled: bool,
}

impl AgentConfig {
    pub fn new(
        name: impl Into<String>,
        capabilities: CapabilityScope,
        working_root: impl Into<PathBuf>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            working_root: working_root.into(),
            max_turns: DEFAULT_MAX_TURNS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            model_id: model_id.into(),
            enabled: true,
        }
    }

    /// Config used for agents missing from the registry when the unknown-agent
    /// policy allows it: unrestricted scope rooted at `working_root`.
    pub fn unrestricted(
        name: impl Into<String>,
        working_root: impl Into<PathBuf>,
        model_id: impl Into<String>,
    ) -> Self {
        Self::new(name, CapabilityScope::unrestricted(), working_root, model_id)
    }

    // ==================== Builder Methods ====================

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check field invariants. Returns the first violation found.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidConfig {
            agent: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.max_turns == 0 {
            return Err(invalid("max_turns must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(invalid("timeout_seconds must be at least 1"));
        }
        if self.working_root.as_os_str().is_empty() {
            return Err(invalid("working_root must not be empty"));
        }
        if self.model_id.trim().is_empty() {
            return Err(invalid("model_id must not be empty"));
        }
        Ok(())
    }
}
