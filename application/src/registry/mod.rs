//! Agent registry
//!
//! Holds the table of validated [`AgentConfig`]s keyed by name. The table is
//! immutable once built: [`AgentRegistry::reload`] builds a replacement off to
//! the side and swaps the whole `Arc` under a short write lock. Readers clone
//! the current `Arc` and never observe a half-built table, and configs already
//! handed to running executions are never touched.

mod policy;

pub use policy::UnknownAgentPolicy;

use crate::ports::registry_source::{
    AgentDefaults, RegistryDocument, RegistrySource, RegistrySourceError,
};
use chrono::{DateTime, Utc};
use fleet_domain::{AgentConfig, ConfigIssue};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Model selector used for unknown agents when neither the registry defaults
/// nor the caller name one.
pub const FALLBACK_MODEL_ID: &str = "default";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown agent: {0}")]
    NotFound(String),

    #[error("Agent '{0}' is disabled")]
    Disabled(String),

    #[error(transparent)]
    Source(#[from] RegistrySourceError),
}

/// One immutable generation of the registry.
#[derive(Debug)]
struct RegistryTable {
    agents: BTreeMap<String, Arc<AgentConfig>>,
    issues: Vec<ConfigIssue>,
    defaults: AgentDefaults,
    origin: String,
    loaded_at: DateTime<Utc>,
}

impl RegistryTable {
    fn build(document: RegistryDocument, origin: String) -> Self {
        let RegistryDocument {
            agents: entries,
            mut issues,
            defaults,
        } = document;

        let mut agents = BTreeMap::new();
        for config in entries {
            if let Err(e) = config.validate() {
                warn!("Skipping agent '{}': {}", config.name, e);
                issues.push(ConfigIssue::skipped_entry(&config.name, e.to_string()));
                continue;
            }
            if agents.contains_key(&config.name) {
                warn!("Skipping duplicate agent '{}'", config.name);
                issues.push(ConfigIssue::skipped_entry(
                    &config.name,
                    "duplicate name; first entry wins",
                ));
                continue;
            }
            agents.insert(config.name.clone(), Arc::new(config));
        }

        Self {
            agents,
            issues,
            defaults,
            origin,
            loaded_at: Utc::now(),
        }
    }
}

/// Registry of agent configurations with atomic reload.
pub struct AgentRegistry {
    table: RwLock<Arc<RegistryTable>>,
    source: Mutex<Arc<dyn RegistrySource>>,
    unknown_policy: UnknownAgentPolicy,
}

impl AgentRegistry {
    /// Load the registry from a source. Fails only if the source document as a
    /// whole is unreadable; bad entries are skipped and reported via
    /// [`issues`](Self::issues).
    pub fn load(
        source: Arc<dyn RegistrySource>,
        unknown_policy: UnknownAgentPolicy,
    ) -> Result<Self, RegistryError> {
        let table = Self::build_table(source.as_ref())?;
        Ok(Self {
            table: RwLock::new(Arc::new(table)),
            source: Mutex::new(source),
            unknown_policy,
        })
    }

    fn build_table(source: &dyn RegistrySource) -> Result<RegistryTable, RegistryError> {
        let origin = source.describe();
        let document = source.load()?;
        let table = RegistryTable::build(document, origin);
        info!(
            "Loaded {} agent(s) from {} ({} issue(s))",
            table.agents.len(),
            table.origin,
            table.issues.len()
        );
        Ok(table)
    }

    fn current(&self) -> Arc<RegistryTable> {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Config for a registered agent, enabled or not.
    pub fn get(&self, name: &str) -> Result<Arc<AgentConfig>, RegistryError> {
        self.current()
            .agents
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Sorted agent names.
    pub fn list(&self, enabled_only: bool) -> Vec<String> {
        self.current()
            .agents
            .values()
            .filter(|config| !enabled_only || config.enabled)
            .map(|config| config.name.clone())
            .collect()
    }

    /// Config to run `name` with, applying the unknown-agent policy and
    /// refusing disabled agents.
    pub fn resolve(&self, name: &str) -> Result<Arc<AgentConfig>, RegistryError> {
        let table = self.current();
        if let Some(config) = table.agents.get(name) {
            if !config.enabled {
                return Err(RegistryError::Disabled(name.to_string()));
            }
            return Ok(config.clone());
        }

        match self.unknown_policy {
            UnknownAgentPolicy::Deny => Err(RegistryError::NotFound(name.to_string())),
            UnknownAgentPolicy::AllowUnrestricted => {
                warn!(
                    "Agent '{}' is not registered; running with unrestricted capabilities",
                    name
                );
                Ok(Arc::new(Self::fallback_config(name, &table.defaults)))
            }
        }
    }

    fn fallback_config(name: &str, defaults: &AgentDefaults) -> AgentConfig {
        let mut config = AgentConfig::unrestricted(
            name,
            defaults
                .working_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            defaults
                .model_id
                .clone()
                .unwrap_or_else(|| FALLBACK_MODEL_ID.to_string()),
        );
        if let Some(max_turns) = defaults.max_turns.filter(|t| *t > 0) {
            config = config.with_max_turns(max_turns);
        }
        if let Some(timeout) = defaults.timeout_seconds.filter(|t| *t > 0) {
            config = config.with_timeout_seconds(timeout);
        }
        config
    }

    /// Rebuild the table from `source` (or the current source) and swap it in.
    ///
    /// On error the previous table stays live and the source is not replaced.
    /// Returns the number of agents in the new table.
    pub fn reload(&self, source: Option<Arc<dyn RegistrySource>>) -> Result<usize, RegistryError> {
        let source = match source {
            Some(source) => source,
            None => self
                .source
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        };

        let table = match Self::build_table(source.as_ref()) {
            Ok(table) => table,
            Err(e) => {
                warn!("Registry reload failed, keeping previous table: {}", e);
                return Err(e);
            }
        };
        let count = table.agents.len();

        *self.table.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(table);
        *self.source.lock().unwrap_or_else(|e| e.into_inner()) = source;
        debug!("Registry table swapped ({} agents)", count);
        Ok(count)
    }

    /// Diagnostics from the last successful load.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        self.current().issues.clone()
    }

    pub fn origin(&self) -> String {
        self.current().origin.clone()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.current().loaded_at
    }

    pub fn unknown_policy(&self) -> UnknownAgentPolicy {
        self.unknown_policy
    }
}
