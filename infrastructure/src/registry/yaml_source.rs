//! YAML agent registry document
//!
//! ```yaml
//! defaults:
//!   working_root: /srv/agents
//!   model_id: sonnet
//!   timeout_seconds: 600
//!
//! agents:
//!   crm:
//!     capabilities: ["Read", "mcp__hubspot__*"]
//!     working_root: /srv/agents/crm
//!   ads:
//!     capabilities: "Read, Grep"     # comma-separated string also accepted
//!     max_turns: 25
//!     enabled: false
//! ```
//!
//! `agents` may also be a list of entries carrying a `name` key. An entry
//! missing `working_root` or `model_id` after defaults, with a field of the
//! wrong type, or with an invalid capability pattern is skipped with a
//! [`ConfigIssue`]. Omitted `capabilities` means no tools.

use fleet_application::{AgentDefaults, RegistryDocument, RegistrySource, RegistrySourceError};
use fleet_domain::agent::config::{DEFAULT_MAX_TURNS, DEFAULT_TIMEOUT_SECONDS};
use fleet_domain::{AgentConfig, CapabilityScope, ConfigIssue};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

enum Origin {
    File(PathBuf),
    Inline(String),
}

/// Registry source reading a YAML document from a file or a string.
pub struct YamlRegistrySource {
    origin: Origin,
}

impl YamlRegistrySource {
    /// A missing file loads as an empty registry.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
        }
    }

    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Inline(text.into()),
        }
    }

    fn read(&self) -> Result<Option<String>, RegistrySourceError> {
        match &self.origin {
            Origin::Inline(text) => Ok(Some(text.clone())),
            Origin::File(path) => read_file(path),
        }
    }
}

fn read_file(path: &Path) -> Result<Option<String>, RegistrySourceError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Registry file {} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(RegistrySourceError::Read {
            origin: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

impl RegistrySource for YamlRegistrySource {
    fn load(&self) -> Result<RegistryDocument, RegistrySourceError> {
        let Some(text) = self.read()? else {
            return Ok(RegistryDocument::empty());
        };
        parse_document(&text, &self.describe())
    }

    fn describe(&self) -> String {
        match &self.origin {
            Origin::File(path) => path.display().to_string(),
            Origin::Inline(_) => "inline".to_string(),
        }
    }
}

/// One agent entry as written. Every field is optional here so that
/// defaults can fill the gaps before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgentEntry {
    name: Option<String>,
    capabilities: Option<RawCapabilities>,
    working_root: Option<PathBuf>,
    #[serde(alias = "model")]
    model_id: Option<String>,
    max_turns: Option<u32>,
    timeout_seconds: Option<u64>,
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCapabilities {
    List(Vec<String>),
    Csv(String),
}

impl RawCapabilities {
    fn into_patterns(self) -> Vec<String> {
        match self {
            RawCapabilities::List(list) => list,
            RawCapabilities::Csv(csv) => csv
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

fn parse_document(text: &str, origin: &str) -> Result<RegistryDocument, RegistrySourceError> {
    let parse_error = |message: String| RegistrySourceError::Parse {
        origin: origin.to_string(),
        message,
    };

    if text.trim().is_empty() {
        return Ok(RegistryDocument::empty());
    }

    let root: Value = serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
    let root = match root {
        Value::Null => return Ok(RegistryDocument::empty()),
        Value::Mapping(map) => map,
        _ => return Err(parse_error("top level must be a mapping".to_string())),
    };

    let defaults: AgentDefaults = match root.get("defaults") {
        None | Some(Value::Null) => AgentDefaults::default(),
        Some(value) => serde_yaml::from_value(value.clone())
            .map_err(|e| parse_error(format!("defaults: {}", e)))?,
    };

    // (key, entry, whether the entry carries a usable name)
    let entries: Vec<(String, Value, bool)> = match root.get("agents") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Mapping(map)) => map
            .iter()
            .map(|(key, value)| (key_name(key), value.clone(), true))
            .collect(),
        Some(Value::Sequence(list)) => list
            .iter()
            .enumerate()
            .map(|(i, value)| match value.get("name").and_then(Value::as_str) {
                Some(name) => (name.to_string(), value.clone(), true),
                // Keyed by position for the diagnostic only
                None => (format!("#{}", i), value.clone(), false),
            })
            .collect(),
        Some(_) => {
            return Err(parse_error(
                "agents must be a mapping or a list".to_string(),
            ));
        }
    };

    let mut document = RegistryDocument {
        agents: Vec::with_capacity(entries.len()),
        issues: Vec::new(),
        defaults,
    };

    for (name, value, named) in entries {
        let built = if named {
            build_entry(&name, value, &document.defaults)
        } else {
            Err("missing field 'name'".to_string())
        };
        match built {
            Ok(config) => document.agents.push(config),
            Err(reason) => {
                warn!("Skipping agent '{}' in {}: {}", name, origin, reason);
                document.issues.push(ConfigIssue::skipped_entry(name, reason));
            }
        }
    }

    Ok(document)
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn build_entry(name: &str, value: Value, defaults: &AgentDefaults) -> Result<AgentConfig, String> {
    let raw: RawAgentEntry = match value {
        Value::Null => RawAgentEntry::default(),
        value => serde_yaml::from_value(value).map_err(|e| e.to_string())?,
    };

    if let Some(explicit) = raw.name.as_deref() {
        if explicit != name {
            return Err(format!("name '{}' does not match key", explicit));
        }
    }

    let working_root = raw
        .working_root
        .or_else(|| defaults.working_root.clone())
        .ok_or("missing field 'working_root'")?;
    let model_id = raw
        .model_id
        .or_else(|| defaults.model_id.clone())
        .ok_or("missing field 'model_id'")?;

    let patterns = match raw.capabilities {
        Some(caps) => caps.into_patterns(),
        None => defaults.capabilities.clone().unwrap_or_default(),
    };
    let capabilities = CapabilityScope::new(patterns).map_err(|e| e.to_string())?;

    Ok(AgentConfig::new(name, capabilities, working_root, model_id)
        .with_max_turns(
            raw.max_turns
                .or(defaults.max_turns)
                .unwrap_or(DEFAULT_MAX_TURNS),
        )
        .with_timeout_seconds(
            raw.timeout_seconds
                .or(defaults.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
        .with_enabled(raw.enabled.unwrap_or(true)))
}
