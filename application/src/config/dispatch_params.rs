//! Dispatch parameters: retry loop control for the orchestration shell.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls how [`DispatchAgentUseCase`](crate::use_cases::dispatch::DispatchAgentUseCase)
/// applies recovery actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Total executions per dispatch, first attempt included.
    pub max_attempts: u32,
    /// Backoffs up to this long are slept inline; longer ones are handed back
    /// to the caller as a deferred retry.
    pub max_inline_backoff: Duration,
    /// A failure further apart than this from the previous one starts a new
    /// streak.
    pub streak_window: Duration,
    /// Classify a "successful" run with no text and no tool activity as an
    /// empty-response failure.
    pub treat_empty_as_failure: bool,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_inline_backoff: Duration::from_secs(30),
            streak_window: Duration::from_secs(600),
            treat_empty_as_failure: true,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    pub fn with_max_inline_backoff(mut self, max: Duration) -> Self {
        self.max_inline_backoff = max;
        self
    }

    pub fn with_streak_window(mut self, window: Duration) -> Self {
        self.streak_window = window;
        self
    }

    pub fn with_treat_empty_as_failure(mut self, enabled: bool) -> Self {
        self.treat_empty_as_failure = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DispatchParams::default();
        assert_eq!(params.max_attempts, 3);
        assert_eq!(params.max_inline_backoff, Duration::from_secs(30));
        assert!(params.treat_empty_as_failure);
    }

    #[test]
    fn test_max_attempts_at_least_one() {
        assert_eq!(DispatchParams::default().with_max_attempts(0).max_attempts, 1);
    }
}
