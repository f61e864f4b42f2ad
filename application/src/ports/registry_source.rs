//! Registry source port
//!
//! A [`RegistrySource`] turns some external document (a YAML file, an inline
//! string) into validated agent configs. Entry-level problems become
//! [`ConfigIssue`]s on the document; only a document that cannot be read or
//! parsed at all is an error.

use fleet_domain::{AgentConfig, ConfigIssue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that make a whole registry document unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrySourceError {
    #[error("Failed to read registry {origin}: {message}")]
    Read { origin: String, message: String },

    #[error("Failed to parse registry {origin}: {message}")]
    Parse { origin: String, message: String },
}

/// Shared defaults declared by the document, applied to omitted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    pub working_root: Option<PathBuf>,
    pub model_id: Option<String>,
    pub max_turns: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub capabilities: Option<Vec<String>>,
}

/// Parsed registry document.
#[derive(Debug, Clone, Default)]
pub struct RegistryDocument {
    /// Entries that parsed and validated, in document order.
    pub agents: Vec<AgentConfig>,
    /// One issue per skipped or suspicious entry.
    pub issues: Vec<ConfigIssue>,
    pub defaults: AgentDefaults,
}

impl RegistryDocument {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Port for loading the agent registry.
pub trait RegistrySource: Send + Sync {
    fn load(&self) -> Result<RegistryDocument, RegistrySourceError>;

    /// Human-readable origin (file path, "inline", ...).
    fn describe(&self) -> String;
}

/// Registry source over an in-memory list of agents.
pub struct StaticRegistrySource {
    agents: Vec<AgentConfig>,
    defaults: AgentDefaults,
}

impl StaticRegistrySource {
    pub fn new(agents: Vec<AgentConfig>) -> Self {
        Self {
            agents,
            defaults: AgentDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: AgentDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

impl RegistrySource for StaticRegistrySource {
    fn load(&self) -> Result<RegistryDocument, RegistrySourceError> {
        Ok(RegistryDocument {
            agents: self.agents.clone(),
            issues: Vec::new(),
            defaults: self.defaults.clone(),
        })
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
