//! Recovery policy: maps a category and streak to a [`RecoveryAction`].
//!
//! | Category | streak 1 | later streaks |
//! |----------|----------|---------------|
//! | `AUTH` | ESCALATE | ESCALATE |
//! | `RATE_LIMIT` | BACKOFF(base) | BACKOFF(base·2ⁿ⁻¹, capped) |
//! | `NETWORK` | RETRY_NOW | BACKOFF(base·2ⁿ⁻², capped) |
//! | `DATA` | RETRY_NOW | PERMANENT_FAILURE |
//! | `TOOL_PROVIDER` | ESCALATE | ESCALATE |
//! | `TIMEOUT` | BACKOFF | PERMANENT_FAILURE from `max_consecutive_timeouts` |
//! | `UNKNOWN` | ESCALATE | ESCALATE |

use super::category::{FailureCategory, RecoveryAction};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the recovery decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    /// First backoff delay.
    pub backoff_base: Duration,
    /// Upper bound for any backoff delay.
    pub backoff_cap: Duration,
    /// The N-th consecutive timeout for an agent is permanent.
    pub max_consecutive_timeouts: u32,
    /// Size bound for diagnostics handed to downstream consumers.
    pub diagnostic_max_bytes: usize,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(300),
            max_consecutive_timeouts: 3,
            diagnostic_max_bytes: 512,
        }
    }
}

impl RecoveryPolicy {
    // ==================== Builder Methods ====================

    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap.max(base);
        self
    }

    pub fn with_max_consecutive_timeouts(mut self, max: u32) -> Self {
        self.max_consecutive_timeouts = max.max(1);
        self
    }

    pub fn with_diagnostic_max_bytes(mut self, max: usize) -> Self {
        self.diagnostic_max_bytes = max;
        self
    }

    /// Exponential backoff for the n-th step (1-based), capped.
    pub fn backoff_delay(&self, step: u32) -> Duration {
        let exponent = step.max(1).saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }

    /// Decide the action for a category given the consecutive same-category
    /// streak (including this failure). A streak of 0 is treated as 1.
    pub fn action_for(&self, category: FailureCategory, streak: u32) -> RecoveryAction {
        let streak = streak.max(1);
        match category {
            FailureCategory::Auth | FailureCategory::ToolProvider | FailureCategory::Unknown => {
                RecoveryAction::Escalate
            }
            FailureCategory::RateLimit => RecoveryAction::RetryWithBackoff(self.backoff_delay(streak)),
            FailureCategory::Network => {
                if streak == 1 {
                    RecoveryAction::RetryNow
                } else {
                    RecoveryAction::RetryWithBackoff(self.backoff_delay(streak - 1))
                }
            }
            FailureCategory::Data => {
                if streak == 1 {
                    RecoveryAction::RetryNow
                } else {
                    RecoveryAction::PermanentFailure
                }
            }
            FailureCategory::Timeout => {
                if streak >= self.max_consecutive_timeouts {
                    RecoveryAction::PermanentFailure
                } else {
                    RecoveryAction::RetryWithBackoff(self.backoff_delay(streak))
                }
            }
        }
    }
}
