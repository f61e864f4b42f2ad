//! Engine parameters: execution engine control.
//!
//! Per-run budgets (turns, wall clock) come from the request. [`EngineParams`]
//! holds the process-wide knobs that are not part of any agent's identity.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    /// How long a timed-out or faulted session gets to shut down after
    /// `cancel()` before the engine stops waiting for it.
    pub cancel_grace: Duration,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            cancel_grace: Duration::from_secs(5),
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }
}
