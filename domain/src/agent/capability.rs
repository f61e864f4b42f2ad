//! Capability scope: which tool invocations an agent may make.
//!
//! A [`CapabilityScope`] is an ordered, de-duplicated set of glob-like
//! patterns over tool names (e.g. `Read`, `mcp__hubspot__*`). The single
//! pattern `*` means unrestricted.

use crate::core::error::DomainError;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard pattern granting every tool.
pub const UNRESTRICTED: &str = "*";

/// Ordered set of permitted tool-name patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CapabilityScope {
    patterns: Vec<String>,
}

impl CapabilityScope {
    /// Build a scope from patterns, keeping first-seen order and dropping
    /// duplicates. Every pattern must be a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.into().trim().to_string();
            if pattern.is_empty() {
                return Err(DomainError::InvalidCapability {
                    pattern,
                    reason: "pattern must not be empty".to_string(),
                });
            }
            if let Err(e) = Pattern::new(&pattern) {
                return Err(DomainError::InvalidCapability {
                    pattern,
                    reason: e.msg.to_string(),
                });
            }
            if !unique.contains(&pattern) {
                unique.push(pattern);
            }
        }
        Ok(Self { patterns: unique })
    }

    /// Scope permitting every tool.
    pub fn unrestricted() -> Self {
        Self {
            patterns: vec![UNRESTRICTED.to_string()],
        }
    }

    /// Scope permitting no tools at all.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_unrestricted(&self) -> bool {
        self.patterns.iter().any(|p| p == UNRESTRICTED)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a tool with this name may be invoked under the scope.
    pub fn permits(&self, tool_name: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        self.patterns.iter().any(|p| {
            Pattern::new(p)
                .map(|pattern| pattern.matches(tool_name))
                .unwrap_or(false)
        })
    }
}

impl Default for CapabilityScope {
    fn default() -> Self {
        Self::none()
    }
}

impl TryFrom<Vec<String>> for CapabilityScope {
    type Error = DomainError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CapabilityScope> for Vec<String> {
    fn from(scope: CapabilityScope) -> Self {
        scope.patterns
    }
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patterns.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", self.patterns.join(", "))
        }
    }
}
