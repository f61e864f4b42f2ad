//! Execution state machine.
//!
//! ```text
//! Streaming ──stream exhausted──▶ Completed
//!     │──────deadline elapsed────▶ TimedOut
//!     └──────backend fault───────▶ Faulted
//! ```
//!
//! Terminal states are absorbing: the first transition out of `Streaming`
//! wins and later ones are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Streaming,
    Completed,
    TimedOut,
    Faulted,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionState::Streaming)
    }

    pub fn complete(self) -> Self {
        self.advance(ExecutionState::Completed)
    }

    pub fn time_out(self) -> Self {
        self.advance(ExecutionState::TimedOut)
    }

    pub fn fault(self) -> Self {
        self.advance(ExecutionState::Faulted)
    }

    fn advance(self, to: ExecutionState) -> Self {
        if self.is_terminal() { self } else { to }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionState::Streaming => "streaming",
            ExecutionState::Completed => "completed",
            ExecutionState::TimedOut => "timed_out",
            ExecutionState::Faulted => "faulted",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_streaming() {
        let state = ExecutionState::default();
        assert_eq!(state, ExecutionState::Streaming);
        assert!(!state.is_terminal());
    }

    #[test]
    fn transitions_from_streaming() {
        assert_eq!(ExecutionState::Streaming.complete(), ExecutionState::Completed);
        assert_eq!(ExecutionState::Streaming.time_out(), ExecutionState::TimedOut);
        assert_eq!(ExecutionState::Streaming.fault(), ExecutionState::Faulted);
    }

    #[test]
    fn terminal_states_are_absorbing() {
        assert_eq!(ExecutionState::TimedOut.complete(), ExecutionState::TimedOut);
        assert_eq!(ExecutionState::Completed.fault(), ExecutionState::Completed);
        assert_eq!(ExecutionState::Faulted.time_out(), ExecutionState::Faulted);
    }
}
