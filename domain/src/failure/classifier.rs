//! Failure classifier.
//!
//! [`FailureClassifier::classify`] is a pure function of the raw failure and
//! the caller's consecutive same-category streak: the same inputs always give
//! the same `(category, action)` pair.
//!
//! Callers that keep per-category streaks use [`FailureClassifier::categorize`]
//! first to learn which counter to bump, then [`FailureClassifier::classify`].

use super::category::{FailureCategory, RecoveryAction};
use super::policy::RecoveryPolicy;
use super::raw::RawFailure;
use super::signatures::first_match;
use crate::core::string::truncate;
use serde::{Deserialize, Serialize};

/// Result of classifying one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: FailureCategory,
    pub action: RecoveryAction,
    /// Size-bounded explanation for humans and logs. Never the full raw fault.
    pub diagnostic: String,
}

/// Stateless classifier over a [`RecoveryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct FailureClassifier {
    policy: RecoveryPolicy,
}

impl FailureClassifier {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Category of a raw failure, independent of any streak.
    pub fn categorize(&self, raw: &RawFailure) -> FailureCategory {
        if let Some(category) = raw.implied_category() {
            return category;
        }
        first_match(raw)
            .map(|signature| signature.category())
            .unwrap_or(FailureCategory::Unknown)
    }

    /// Classify a raw failure given the consecutive same-category streak for
    /// the agent (including this failure).
    pub fn classify(&self, raw: &RawFailure, streak: u32) -> Classification {
        let category = self.categorize(raw);
        let action = self.policy.action_for(category, streak);
        Classification {
            category,
            action,
            diagnostic: self.diagnostic(category, raw),
        }
    }

    fn diagnostic(&self, category: FailureCategory, raw: &RawFailure) -> String {
        let mut text = format!("{}: {}", category, category.explanation());
        if let Some(tool) = raw.tool_name() {
            text.push_str(&format!(" (tool: {})", tool));
        }
        if let Some(status) = raw.status_code {
            text.push_str(&format!(" (status: {})", status));
        }
        text.push_str(" | ");
        text.push_str(&raw.message);
        truncate(&text, self.policy.diagnostic_max_bytes)
    }
}
