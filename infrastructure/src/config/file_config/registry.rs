//! Registry configuration from TOML (`[registry]` section)

use fleet_application::UnknownAgentPolicy;
use fleet_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw registry configuration from TOML
///
/// # Example
///
/// ```toml
/// [registry]
/// path = "agents.yaml"
/// unknown_agent = "deny"        # "deny" or "allow_unrestricted"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Agent registry document (YAML). Relative paths resolve against the
    /// current directory.
    pub path: PathBuf,
    /// What to do with agents missing from the registry
    pub unknown_agent: String,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("agents.yaml"),
            unknown_agent: UnknownAgentPolicy::default().as_str().to_string(),
        }
    }
}

impl FileRegistryConfig {
    /// Parse unknown_agent into the policy enum, returning warnings on failure.
    pub fn parse_unknown_agent(&self) -> (UnknownAgentPolicy, Vec<ConfigIssue>) {
        match UnknownAgentPolicy::parse(&self.unknown_agent) {
            Some(policy) => (policy, vec![]),
            None => {
                let fallback = UnknownAgentPolicy::default();
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "registry.unknown_agent".to_string(),
                        value: self.unknown_agent.clone(),
                        valid_values: UnknownAgentPolicy::valid_values(),
                    },
                    message: format!(
                        "registry.unknown_agent: unknown value '{}', falling back to '{}'",
                        self.unknown_agent, fallback
                    ),
                };
                (fallback, vec![issue])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denies_unknown_agents() {
        let config = FileRegistryConfig::default();
        let (policy, issues) = config.parse_unknown_agent();
        assert_eq!(policy, UnknownAgentPolicy::Deny);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_allow_unrestricted() {
        let config = FileRegistryConfig {
            unknown_agent: "allow-unrestricted".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.parse_unknown_agent().0,
            UnknownAgentPolicy::AllowUnrestricted
        );
    }

    #[test]
    fn test_invalid_policy_falls_back_with_warning() {
        let config = FileRegistryConfig {
            unknown_agent: "maybe".to_string(),
            ..Default::default()
        };
        let (policy, issues) = config.parse_unknown_agent();
        assert_eq!(policy, UnknownAgentPolicy::Deny);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.contains("'maybe'"));
    }
}
