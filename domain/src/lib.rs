//! Domain layer for agent-fleet
//!
//! This crate contains the core business rules of the agent execution engine.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Agent
//!
//! An [`AgentConfig`] is the immutable identity of one automation agent: which
//! tools it may invoke ([`CapabilityScope`]), where its tools are confined
//! (working root), and how much turn and wall-clock budget a run gets.
//!
//! ## Execution
//!
//! One run streams [`BackendEvent`]s from the inference backend and is folded
//! into exactly one [`ExecutionResult`]. The run moves through
//! [`ExecutionState`]: `Streaming → {Completed, TimedOut, Faulted}`.
//!
//! ## Failure
//!
//! A failed run carries a [`RawFailure`]. The [`FailureClassifier`] maps it to a
//! [`FailureCategory`] and a [`RecoveryAction`], escalating monotonically with
//! the caller-supplied streak of same-category failures.

pub mod agent;
pub mod core;
pub mod execution;
pub mod failure;
pub mod status;

// Re-export commonly used types
pub use agent::{
    capability::CapabilityScope,
    config::AgentConfig,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use core::{error::DomainError, string::truncate};
pub use execution::{
    event::{BackendEvent, TerminalStatus},
    payload::extract_json_payload,
    result::{ExecutionFailure, ExecutionResult},
    state::ExecutionState,
    tally::ExecutionTally,
};
pub use failure::{
    category::{FailureCategory, RecoveryAction},
    classifier::{Classification, FailureClassifier},
    policy::RecoveryPolicy,
    raw::{FailureSource, RawFailure},
};
pub use status::{Activity, ActivityOutcome, HealthState, StatusSnapshot, SubsystemStatus};
