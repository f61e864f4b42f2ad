//! The single result produced for each execution request.

use super::payload::extract_json_payload;
use super::state::ExecutionState;
use super::tally::ExecutionTally;
use crate::failure::category::FailureCategory;
use crate::failure::classifier::Classification;
use crate::failure::raw::RawFailure;
use serde::{Deserialize, Serialize};

/// Failure details attached to an unsuccessful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    /// `Some(Timeout)` when the engine's deadline fired. Other faults carry
    /// `None` until the classifier has run (see [`ExecutionResult::classified`]).
    pub category: Option<FailureCategory>,
    /// Short human-readable explanation.
    pub message: String,
    /// The raw fault as the backend or transport reported it.
    pub detail: RawFailure,
}

/// Outcome of one execution.
///
/// Invariant: `succeeded == true` iff `failure.is_none()`. Partial text and
/// counters are kept on failure so an escalation comes with evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub response_text: String,
    /// Derived from `response_text`; absence does not imply failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_payload: Option<serde_json::Value>,
    pub message_count: u64,
    pub tool_invocation_count: u64,
    pub duration_millis: u64,
    pub final_state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionResult {
    /// Stream exhausted before the deadline.
    pub fn completed(tally: ExecutionTally, duration_millis: u64) -> Self {
        let structured_payload = extract_json_payload(&tally.response_text);
        Self {
            succeeded: true,
            structured_payload,
            response_text: tally.response_text,
            message_count: tally.message_count,
            tool_invocation_count: tally.tool_invocation_count,
            duration_millis,
            final_state: ExecutionState::Completed,
            failure: None,
        }
    }

    /// Deadline elapsed; whatever arrived so far is preserved.
    pub fn timed_out(tally: ExecutionTally, duration_millis: u64, timeout_seconds: u64) -> Self {
        let detail = RawFailure::deadline(timeout_seconds);
        Self::failed(
            tally,
            duration_millis,
            ExecutionState::TimedOut,
            ExecutionFailure {
                category: Some(FailureCategory::Timeout),
                message: detail.message.clone(),
                detail,
            },
        )
    }

    /// The backend or transport raised a fault.
    pub fn faulted(tally: ExecutionTally, duration_millis: u64, detail: RawFailure) -> Self {
        Self::failed(
            tally,
            duration_millis,
            ExecutionState::Faulted,
            ExecutionFailure {
                category: None,
                message: detail.summary(),
                detail,
            },
        )
    }

    fn failed(
        tally: ExecutionTally,
        duration_millis: u64,
        final_state: ExecutionState,
        failure: ExecutionFailure,
    ) -> Self {
        Self {
            succeeded: false,
            response_text: tally.response_text,
            structured_payload: None,
            message_count: tally.message_count,
            tool_invocation_count: tally.tool_invocation_count,
            duration_millis,
            final_state,
            failure: Some(failure),
        }
    }

    /// Turn a completed run into a failed one, e.g. when it produced nothing
    /// (see [`RawFailure::anomaly_in`]). Text and counters are kept.
    pub fn into_failure(mut self, detail: RawFailure) -> Self {
        if !self.succeeded {
            return self;
        }
        self.succeeded = false;
        self.structured_payload = None;
        self.final_state = ExecutionState::Faulted;
        self.failure = Some(ExecutionFailure {
            category: None,
            message: detail.summary(),
            detail,
        });
        self
    }

    /// Attach a classification's category to the failure, if any.
    pub fn classified(mut self, classification: &Classification) -> Self {
        if let Some(failure) = self.failure.as_mut() {
            failure.category = Some(classification.category);
        }
        self
    }

    pub fn failure_category(&self) -> Option<FailureCategory> {
        self.failure.as_ref().and_then(|f| f.category)
    }
}
