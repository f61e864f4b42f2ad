//! Recovery configuration from TOML (`[recovery]` section)
//!
//! Feeds both the classifier's [`RecoveryPolicy`] and the dispatch loop's
//! [`DispatchParams`].

use fleet_application::DispatchParams;
use fleet_domain::{ConfigIssue, RecoveryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw recovery configuration from TOML
///
/// # Example
///
/// ```toml
/// [recovery]
/// backoff_base_ms = 2000
/// backoff_cap_ms = 300000
/// max_consecutive_timeouts = 3
/// diagnostic_max_bytes = 512
/// streak_window_secs = 600
/// max_attempts = 3
/// max_inline_backoff_secs = 30
/// treat_empty_as_failure = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecoveryConfig {
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// The N-th consecutive timeout of an agent is permanent
    pub max_consecutive_timeouts: u32,
    pub diagnostic_max_bytes: usize,
    /// Failures further apart than this do not extend a streak
    pub streak_window_secs: u64,
    /// Executions per dispatch, including the first
    pub max_attempts: u32,
    /// Longer backoffs are handed back to the caller instead of slept inline
    pub max_inline_backoff_secs: u64,
    /// A successful run with no output counts as an empty-response failure
    pub treat_empty_as_failure: bool,
}

impl Default for FileRecoveryConfig {
    fn default() -> Self {
        let policy = RecoveryPolicy::default();
        let dispatch = DispatchParams::default();
        Self {
            backoff_base_ms: policy.backoff_base.as_millis() as u64,
            backoff_cap_ms: policy.backoff_cap.as_millis() as u64,
            max_consecutive_timeouts: policy.max_consecutive_timeouts,
            diagnostic_max_bytes: policy.diagnostic_max_bytes,
            streak_window_secs: dispatch.streak_window.as_secs(),
            max_attempts: dispatch.max_attempts,
            max_inline_backoff_secs: dispatch.max_inline_backoff.as_secs(),
            treat_empty_as_failure: dispatch.treat_empty_as_failure,
        }
    }
}

impl FileRecoveryConfig {
    pub fn to_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::default()
            .with_backoff(
                Duration::from_millis(self.backoff_base_ms),
                Duration::from_millis(self.backoff_cap_ms),
            )
            .with_max_consecutive_timeouts(self.max_consecutive_timeouts)
            .with_diagnostic_max_bytes(self.diagnostic_max_bytes)
    }

    pub fn to_dispatch_params(&self) -> DispatchParams {
        DispatchParams::default()
            .with_max_attempts(self.max_attempts)
            .with_max_inline_backoff(Duration::from_secs(self.max_inline_backoff_secs))
            .with_streak_window(Duration::from_secs(self.streak_window_secs))
            .with_treat_empty_as_failure(self.treat_empty_as_failure)
    }

    /// Values that get silently clamped by the builders.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.backoff_cap_ms < self.backoff_base_ms {
            issues.push(ConfigIssue::invalid_value(
                "recovery.backoff_cap_ms",
                self.backoff_cap_ms.to_string(),
                "below backoff_base_ms, using backoff_base_ms",
            ));
        }
        if self.max_consecutive_timeouts == 0 {
            issues.push(ConfigIssue::invalid_value(
                "recovery.max_consecutive_timeouts",
                "0",
                "must be at least 1, using 1",
            ));
        }
        if self.max_attempts == 0 {
            issues.push(ConfigIssue::invalid_value(
                "recovery.max_attempts",
                "0",
                "must be at least 1, using 1",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_defaults() {
        let config = FileRecoveryConfig::default();
        assert_eq!(config.to_policy(), RecoveryPolicy::default());
        let params = config.to_dispatch_params();
        assert_eq!(params.max_attempts, DispatchParams::default().max_attempts);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_to_policy() {
        let config = FileRecoveryConfig {
            backoff_base_ms: 500,
            backoff_cap_ms: 4_000,
            max_consecutive_timeouts: 2,
            ..Default::default()
        };
        let policy = config.to_policy();
        assert_eq!(policy.backoff_base, Duration::from_millis(500));
        assert_eq!(policy.backoff_cap, Duration::from_secs(4));
        assert_eq!(policy.max_consecutive_timeouts, 2);
    }

    #[test]
    fn test_clamped_values_are_reported() {
        let config = FileRecoveryConfig {
            backoff_base_ms: 5_000,
            backoff_cap_ms: 1_000,
            max_attempts: 0,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert_eq!(config.to_dispatch_params().max_attempts, 1);
        assert_eq!(config.to_policy().backoff_cap, Duration::from_secs(5));
    }
}
