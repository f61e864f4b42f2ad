//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application types on
//! demand (`to_policy`, `to_dispatch_params`, `parse_unknown_agent`).

mod backend;
mod recovery;
mod registry;
mod status;
mod trace;

pub use backend::FileBackendConfig;
pub use recovery::FileRecoveryConfig;
pub use registry::FileRegistryConfig;
pub use status::FileStatusConfig;
pub use trace::FileTraceConfig;

use fleet_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors that leave nothing sensible to fall back to
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.command cannot be empty")]
    EmptyBackendCommand,

    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Agent registry location and unknown-agent policy
    pub registry: FileRegistryConfig,
    /// Inference backend process
    pub backend: FileBackendConfig,
    /// Per-run trace files
    pub trace: FileTraceConfig,
    /// Failure classification and dispatch retries
    pub recovery: FileRecoveryConfig,
    /// Activity cache behind the status surface
    pub status: FileStatusConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Fatal problems (those [`check`](Self::check) rejects) are reported
    /// with `Severity::Error`; the rest are warnings about values that fall
    /// back to defaults or get clamped.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.registry.parse_unknown_agent().1);
        issues.extend(self.recovery.validate());

        if let Err(e) = self.check() {
            let field = match &e {
                ConfigValidationError::EmptyBackendCommand => "backend.command",
                ConfigValidationError::ZeroValue { field } => *field,
            };
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::InvalidValue {
                    field: field.to_string(),
                    value: String::new(),
                },
                message: e.to_string(),
            });
        }

        issues
    }

    /// Reject configurations the process cannot start with.
    pub fn check(&self) -> Result<(), ConfigValidationError> {
        if self.backend.command.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBackendCommand);
        }
        if self.trace.buffer == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "trace.buffer",
            });
        }
        if self.trace.write_timeout_ms == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "trace.write_timeout_ms",
            });
        }
        if self.status.capacity == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "status.capacity",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_application::UnknownAgentPolicy;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[registry]
path = "/etc/agent-fleet/agents.yaml"
unknown_agent = "allow_unrestricted"

[backend]
command = "/usr/local/bin/claude"
args = ["-p", "--output-format", "stream-json"]
cancel_grace_ms = 1500

[trace]
dir = "/var/log/agent-fleet"
buffer = 64

[recovery]
backoff_base_ms = 1000
max_attempts = 5

[status]
ttl_secs = 60
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.registry.path.to_string_lossy(),
            "/etc/agent-fleet/agents.yaml"
        );
        assert_eq!(
            config.registry.parse_unknown_agent().0,
            UnknownAgentPolicy::AllowUnrestricted
        );
        assert_eq!(config.backend.command, "/usr/local/bin/claude");
        assert_eq!(config.backend.args.len(), 3);
        assert_eq!(config.backend.cancel_grace().as_millis(), 1500);
        assert_eq!(config.trace.buffer, 64);
        assert!(config.trace.dir.is_some());
        assert_eq!(config.recovery.to_dispatch_params().max_attempts, 5);
        // Untouched keys keep their defaults
        assert_eq!(config.recovery.max_consecutive_timeouts, 3);
        assert_eq!(config.status.ttl_secs, 60);
        assert_eq!(config.status.capacity, 1_024);
    }

    #[test]
    fn test_deserialize_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.command, "claude");
        assert!(config.trace.dir.is_none());
        assert!(config.validate().is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_check_rejects_empty_command() {
        let mut config = FileConfig::default();
        config.backend.command = "  ".to_string();
        assert_eq!(
            config.check(),
            Err(ConfigValidationError::EmptyBackendCommand)
        );

        let issues = config.validate();
        assert!(ConfigIssue::has_errors(&issues));
    }

    #[test]
    fn test_check_rejects_zero_buffer() {
        let mut config = FileConfig::default();
        config.trace.buffer = 0;
        assert_eq!(
            config.check(),
            Err(ConfigValidationError::ZeroValue {
                field: "trace.buffer"
            })
        );
    }

    #[test]
    fn test_validate_collects_warnings() {
        let mut config = FileConfig::default();
        config.registry.unknown_agent = "sometimes".to_string();
        config.recovery.max_attempts = 0;

        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(!ConfigIssue::has_errors(&issues));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::InvalidEnumValue { field, .. } if field == "registry.unknown_agent"
        )));
    }
}
