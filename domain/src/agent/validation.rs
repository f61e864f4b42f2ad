//! Configuration issues reported while loading agents and settings.
//!
//! Loading never aborts over a single bad entry. Instead each problem is
//! recorded as a [`ConfigIssue`] with a severity, a structured code, and a
//! human-readable message, and the offending entry is skipped.
//!
//! # Examples
//!
//! ```
//! use fleet_domain::{ConfigIssue, Severity};
//!
//! let issue = ConfigIssue::skipped_entry("finance", "missing field 'working_root'");
//! assert_eq!(issue.severity, Severity::Warning);
//! assert!(issue.message.contains("finance"));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but something was ignored.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// An agent entry was dropped from the registry.
    SkippedEntry { agent: String },
    /// A field holds a value outside its allowed set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A numeric or path field is out of range.
    InvalidValue { field: String, value: String },
}

/// A detected issue in a configuration source.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn skipped_entry(agent: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let agent = agent.into();
        Self {
            severity: Severity::Warning,
            message: format!("agent '{}' skipped: {}", agent, reason.as_ref()),
            code: ConfigIssueCode::SkippedEntry { agent },
        }
    }

    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>, reason: &str) -> Self {
        let field = field.into();
        let value = value.into();
        Self {
            severity: Severity::Warning,
            message: format!("{}: invalid value '{}' ({})", field, value, reason),
            code: ConfigIssueCode::InvalidValue { field, value },
        }
    }

    /// Check a list of issues for any fatal entry
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}
