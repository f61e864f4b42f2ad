//! Execution of one task against the inference backend.
//!
//! - [`event::BackendEvent`]: one item of the backend's ordered event stream
//! - [`tally::ExecutionTally`]: running aggregation of a stream
//! - [`state::ExecutionState`]: `Streaming → {Completed, TimedOut, Faulted}`
//! - [`result::ExecutionResult`]: the single result of a run
//! - [`payload::extract_json_payload`]: best-effort structured output

pub mod event;
pub mod payload;
pub mod result;
pub mod state;
pub mod tally;
