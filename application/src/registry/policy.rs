//! What to do when a caller names an agent the registry does not know.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownAgentPolicy {
    /// Unknown names are a `NotFound` error.
    #[default]
    Deny,
    /// Unknown names resolve to an unrestricted config built from the
    /// registry defaults. Permissive; intended for local development.
    AllowUnrestricted,
}

impl UnknownAgentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownAgentPolicy::Deny => "deny",
            UnknownAgentPolicy::AllowUnrestricted => "allow_unrestricted",
        }
    }

    /// Parse a config value. Returns `None` for unrecognized values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "deny" => Some(UnknownAgentPolicy::Deny),
            "allow_unrestricted" | "allow" => Some(UnknownAgentPolicy::AllowUnrestricted),
            _ => None,
        }
    }

    pub fn valid_values() -> Vec<String> {
        vec!["deny".to_string(), "allow_unrestricted".to_string()]
    }
}

impl fmt::Display for UnknownAgentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_variants() {
        assert_eq!(UnknownAgentPolicy::parse("deny"), Some(UnknownAgentPolicy::Deny));
        assert_eq!(
            UnknownAgentPolicy::parse("Allow-Unrestricted"),
            Some(UnknownAgentPolicy::AllowUnrestricted)
        );
        assert_eq!(UnknownAgentPolicy::parse("maybe"), None);
    }

    #[test]
    fn default_is_deny() {
        assert_eq!(UnknownAgentPolicy::default(), UnknownAgentPolicy::Deny);
    }
}
