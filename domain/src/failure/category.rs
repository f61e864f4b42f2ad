//! Failure categories and recovery actions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    /// Invalid or expired credentials.
    Auth,
    /// Rate limiting or quota exhaustion.
    RateLimit,
    /// Transport or connectivity failure.
    Network,
    /// Empty or malformed response data.
    Data,
    /// A specific tool invocation reported an error.
    ToolProvider,
    /// The engine's own wall-clock deadline elapsed.
    Timeout,
    /// Nothing matched.
    Unknown,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Auth => "AUTH",
            FailureCategory::RateLimit => "RATE_LIMIT",
            FailureCategory::Network => "NETWORK",
            FailureCategory::Data => "DATA",
            FailureCategory::ToolProvider => "TOOL_PROVIDER",
            FailureCategory::Timeout => "TIMEOUT",
            FailureCategory::Unknown => "UNKNOWN",
        }
    }

    /// One-line explanation used as the diagnostic prefix.
    pub fn explanation(&self) -> &'static str {
        match self {
            FailureCategory::Auth => "credentials rejected; refresh them before retrying",
            FailureCategory::RateLimit => "rate limit or quota reached",
            FailureCategory::Network => "transport or connectivity failure",
            FailureCategory::Data => "empty or malformed response",
            FailureCategory::ToolProvider => "tool provider reported an error",
            FailureCategory::Timeout => "execution exceeded its wall-clock budget",
            FailureCategory::Unknown => "unrecognized failure; needs investigation",
        }
    }

    pub fn all() -> [FailureCategory; 7] {
        [
            FailureCategory::Auth,
            FailureCategory::RateLimit,
            FailureCategory::Network,
            FailureCategory::Data,
            FailureCategory::ToolProvider,
            FailureCategory::Timeout,
            FailureCategory::Unknown,
        ]
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the caller should do about a classified failure.
///
/// Actions are totally ordered by severity:
/// `RetryNow < RetryWithBackoff(d) < Escalate < PermanentFailure`, with
/// backoffs ordered by delay. A growing streak never yields a less severe
/// action for the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "delay_ms", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryAction {
    RetryNow,
    RetryWithBackoff(#[serde(with = "duration_ms")] Duration),
    Escalate,
    PermanentFailure,
}

impl RecoveryAction {
    fn rank(&self) -> u8 {
        match self {
            RecoveryAction::RetryNow => 0,
            RecoveryAction::RetryWithBackoff(_) => 1,
            RecoveryAction::Escalate => 2,
            RecoveryAction::PermanentFailure => 3,
        }
    }

    /// Whether the caller may re-run the execution without a human.
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            RecoveryAction::RetryNow | RecoveryAction::RetryWithBackoff(_)
        )
    }

    pub fn delay(&self) -> Option<Duration> {
        match self {
            RecoveryAction::RetryWithBackoff(delay) => Some(*delay),
            _ => None,
        }
    }
}

impl PartialOrd for RecoveryAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecoveryAction {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RecoveryAction::RetryWithBackoff(a), RecoveryAction::RetryWithBackoff(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::RetryNow => write!(f, "RETRY_NOW"),
            RecoveryAction::RetryWithBackoff(delay) => {
                write!(f, "RETRY_WITH_BACKOFF({}ms)", delay.as_millis())
            }
            RecoveryAction::Escalate => write!(f, "ESCALATE"),
            RecoveryAction::PermanentFailure => write!(f, "PERMANENT_FAILURE"),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        let now = RecoveryAction::RetryNow;
        let short = RecoveryAction::RetryWithBackoff(Duration::from_secs(1));
        let long = RecoveryAction::RetryWithBackoff(Duration::from_secs(60));
        assert!(now < short);
        assert!(short < long);
        assert!(long < RecoveryAction::Escalate);
        assert!(RecoveryAction::Escalate < RecoveryAction::PermanentFailure);
    }

    #[test]
    fn retry_helpers() {
        assert!(RecoveryAction::RetryNow.is_retry());
        assert!(RecoveryAction::RetryWithBackoff(Duration::from_millis(5)).is_retry());
        assert!(!RecoveryAction::Escalate.is_retry());
        assert_eq!(
            RecoveryAction::RetryWithBackoff(Duration::from_millis(5)).delay(),
            Some(Duration::from_millis(5))
        );
        assert_eq!(RecoveryAction::PermanentFailure.delay(), None);
    }

    #[test]
    fn display() {
        assert_eq!(FailureCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(
            RecoveryAction::RetryWithBackoff(Duration::from_millis(2500)).to_string(),
            "RETRY_WITH_BACKOFF(2500ms)"
        );
    }

    #[test]
    fn serializes_delay_in_millis() {
        let json =
            serde_json::to_value(RecoveryAction::RetryWithBackoff(Duration::from_secs(4))).unwrap();
        assert_eq!(json, serde_json::json!({"action": "RETRY_WITH_BACKOFF", "delay_ms": 4000}));

        let json = serde_json::to_value(RecoveryAction::Escalate).unwrap();
        assert_eq!(json, serde_json::json!({"action": "ESCALATE"}));
    }

    #[test]
    fn category_serializes_screaming() {
        let json = serde_json::to_value(FailureCategory::ToolProvider).unwrap();
        assert_eq!(json, "TOOL_PROVIDER");
    }
}
