//! Port for per-execution trace logging.
//!
//! Defines the [`TraceSink`] trait for recording what happened during one run
//! (each backend event as it arrives, plus start and end markers) to an
//! append-only target.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! process diagnostics, while a trace sink captures one execution's transcript
//! for the humans who investigate an escalation.

use chrono::{DateTime, Utc};
use fleet_domain::{BackendEvent, TerminalStatus};

/// One trace line.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub at: DateTime<Utc>,
    /// Record kind (e.g., "start", "text", "tool_call", "end").
    pub kind: &'static str,
    pub detail: String,
}

impl TraceRecord {
    /// Create a record stamped with the current UTC time.
    pub fn new(kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            kind,
            detail: detail.into(),
        }
    }

    /// Record mirroring a backend event.
    pub fn from_event(event: &BackendEvent) -> Self {
        let detail = match event {
            BackendEvent::Text { text } => text.clone(),
            BackendEvent::ToolInvocation { name, input } => {
                if input.is_null() {
                    name.clone()
                } else {
                    format!("{} {}", name, input)
                }
            }
            BackendEvent::ToolResult {
                name,
                content,
                is_error,
            } => {
                let name = name.as_deref().unwrap_or("?");
                if *is_error {
                    format!("{} [error] {}", name, content)
                } else {
                    format!("{} {}", name, content)
                }
            }
            BackendEvent::Terminal(TerminalStatus::Completed) => "completed".to_string(),
            BackendEvent::Terminal(TerminalStatus::Failed { message }) => {
                format!("failed: {}", message)
            }
        };
        Self::new(event.label(), detail)
    }
}

/// Port for writing trace records.
///
/// `record` is synchronous and non-fallible: a slow or failing sink may drop
/// records but must never fail or stall the execution it observes.
pub trait TraceSink: Send + Sync {
    fn record(&self, record: TraceRecord);
}

/// No-op sink for tests and when tracing is disabled.
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn record(&self, _record: TraceRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_records_use_event_labels() {
        let record = TraceRecord::from_event(&BackendEvent::tool_invocation(
            "Read",
            json!({"path": "notes.md"}),
        ));
        assert_eq!(record.kind, "tool_call");
        assert_eq!(record.detail, r#"Read {"path":"notes.md"}"#);

        let record = TraceRecord::from_event(&BackendEvent::tool_result(
            Some("Bash".to_string()),
            "exit 1",
            true,
        ));
        assert_eq!(record.kind, "tool_result");
        assert_eq!(record.detail, "Bash [error] exit 1");

        let record = TraceRecord::from_event(&BackendEvent::failed("boom"));
        assert_eq!(record.kind, "status");
        assert_eq!(record.detail, "failed: boom");
    }
}
