//! Events streamed by the inference backend during one session.
//!
//! The backend yields events in causal order. The engine folds them into an
//! [`ExecutionTally`](super::tally::ExecutionTally) and mirrors each one to the
//! trace; none is reordered or dropped.

use serde::{Deserialize, Serialize};

/// How a backend session ended, as reported by the backend itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminalStatus {
    /// The backend finished the task normally.
    Completed,
    /// The backend gave up; `message` is the raw reason it reported.
    Failed { message: String },
}

/// One event in a backend session's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendEvent {
    /// A fragment of model output text.
    Text { text: String },
    /// The model invoked a tool.
    ToolInvocation {
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// A tool returned. Passed through to the trace only.
    ToolResult {
        name: Option<String>,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    /// The session's final status.
    Terminal(TerminalStatus),
}

impl BackendEvent {
    pub fn text(text: impl Into<String>) -> Self {
        BackendEvent::Text { text: text.into() }
    }

    pub fn tool_invocation(name: impl Into<String>, input: serde_json::Value) -> Self {
        BackendEvent::ToolInvocation {
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(name: Option<String>, content: impl Into<String>, is_error: bool) -> Self {
        BackendEvent::ToolResult {
            name,
            content: content.into(),
            is_error,
        }
    }

    pub fn completed() -> Self {
        BackendEvent::Terminal(TerminalStatus::Completed)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        BackendEvent::Terminal(TerminalStatus::Failed {
            message: message.into(),
        })
    }

    /// Short label used in traces and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            BackendEvent::Text { .. } => "text",
            BackendEvent::ToolInvocation { .. } => "tool_call",
            BackendEvent::ToolResult { .. } => "tool_result",
            BackendEvent::Terminal(_) => "status",
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BackendEvent::Terminal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(BackendEvent::text("hi").label(), "text");
        assert_eq!(
            BackendEvent::tool_invocation("Read", serde_json::json!({})).label(),
            "tool_call"
        );
        assert_eq!(BackendEvent::tool_result(None, "ok", false).label(), "tool_result");
        assert_eq!(BackendEvent::completed().label(), "status");
    }

    #[test]
    fn only_terminal_events_are_terminal() {
        assert!(BackendEvent::completed().is_terminal());
        assert!(BackendEvent::failed("boom").is_terminal());
        assert!(!BackendEvent::text("partial").is_terminal());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(BackendEvent::text("42")).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["text"], "42");
    }
}
