//! Health status surface.
//!
//! Each subsystem (the registry, the backend, each agent) reports a
//! [`HealthState`] and the time of its last activity. Health is derived from
//! the most recent recorded [`Activity`].

use crate::failure::category::{FailureCategory, RecoveryAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Down,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Down => "down",
        }
    }

    /// Worst of two states.
    pub fn worst(self, other: HealthState) -> HealthState {
        self.max(other)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a recorded execution ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActivityOutcome {
    Succeeded,
    Failed {
        category: FailureCategory,
        action: RecoveryAction,
    },
}

/// One recorded execution for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: ActivityOutcome,
    pub duration_millis: u64,
}

impl Activity {
    pub fn succeeded(at: DateTime<Utc>, duration_millis: u64) -> Self {
        Self {
            at,
            outcome: ActivityOutcome::Succeeded,
            duration_millis,
        }
    }

    pub fn failed(
        at: DateTime<Utc>,
        duration_millis: u64,
        category: FailureCategory,
        action: RecoveryAction,
    ) -> Self {
        Self {
            at,
            outcome: ActivityOutcome::Failed { category, action },
            duration_millis,
        }
    }

    /// Health implied by this activity alone.
    ///
    /// A retryable failure leaves the agent degraded; anything that needs a
    /// human (escalation or permanent failure) marks it down.
    pub fn health(&self) -> HealthState {
        match &self.outcome {
            ActivityOutcome::Succeeded => HealthState::Healthy,
            ActivityOutcome::Failed { action, .. } if action.is_retry() => HealthState::Degraded,
            ActivityOutcome::Failed { .. } => HealthState::Down,
        }
    }
}

/// Status of one named subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemStatus {
    pub name: String,
    pub health: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubsystemStatus {
    pub fn new(name: impl Into<String>, health: HealthState) -> Self {
        Self {
            name: name.into(),
            health,
            last_activity: None,
            detail: None,
        }
    }

    /// Status derived from the latest activity. No activity reads as healthy
    /// with no timestamp.
    pub fn from_activity(name: impl Into<String>, latest: Option<&Activity>) -> Self {
        match latest {
            Some(activity) => {
                let mut status = Self::new(name, activity.health());
                status.last_activity = Some(activity.at);
                if let ActivityOutcome::Failed { category, action } = &activity.outcome {
                    status.detail = Some(format!("{} -> {}", category, action));
                }
                status
            }
            None => Self::new(name, HealthState::Healthy),
        }
    }

    pub fn with_last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity = Some(at);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Point-in-time health of every subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub generated_at: DateTime<Utc>,
    pub subsystems: Vec<SubsystemStatus>,
}

impl StatusSnapshot {
    pub fn new(generated_at: DateTime<Utc>, subsystems: Vec<SubsystemStatus>) -> Self {
        Self {
            generated_at,
            subsystems,
        }
    }

    /// Worst health across all subsystems; healthy when there are none.
    pub fn overall(&self) -> HealthState {
        self.subsystems
            .iter()
            .map(|s| s.health)
            .fold(HealthState::Healthy, HealthState::worst)
    }

    pub fn get(&self, name: &str) -> Option<&SubsystemStatus> {
        self.subsystems.iter().find(|s| s.name == name)
    }
}
