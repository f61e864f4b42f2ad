//! Running aggregation of a backend event stream.

use super::event::BackendEvent;

/// Accumulates text and counters as events arrive.
///
/// Text fragments are concatenated in arrival order; `message_count` counts
/// text events and `tool_invocation_count` counts tool invocations, whatever
/// the interleaving. Tool results and terminal events change nothing here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTally {
    pub response_text: String,
    pub message_count: u64,
    pub tool_invocation_count: u64,
}

impl ExecutionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &BackendEvent) {
        match event {
            BackendEvent::Text { text } => {
                self.response_text.push_str(text);
                self.message_count += 1;
            }
            BackendEvent::ToolInvocation { .. } => {
                self.tool_invocation_count += 1;
            }
            BackendEvent::ToolResult { .. } | BackendEvent::Terminal(_) => {}
        }
    }

    /// Nothing observable happened: no text and no tool activity.
    pub fn is_empty(&self) -> bool {
        self.response_text.trim().is_empty() && self.tool_invocation_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_each_event_kind_for_any_interleaving() {
        let events = vec![
            BackendEvent::tool_invocation("Read", json!({"path": "a.md"})),
            BackendEvent::text("Hello"),
            BackendEvent::tool_result(Some("Read".to_string()), "contents", false),
            BackendEvent::text(", "),
            BackendEvent::tool_invocation("Grep", json!({})),
            BackendEvent::tool_invocation("Read", json!({})),
            BackendEvent::text("world"),
            BackendEvent::completed(),
        ];

        let mut tally = ExecutionTally::new();
        for event in &events {
            tally.observe(event);
        }

        let texts = events
            .iter()
            .filter(|e| matches!(e, BackendEvent::Text { .. }))
            .count() as u64;
        let invocations = events
            .iter()
            .filter(|e| matches!(e, BackendEvent::ToolInvocation { .. }))
            .count() as u64;

        assert_eq!(tally.response_text, "Hello, world");
        assert_eq!(tally.message_count, texts);
        assert_eq!(tally.tool_invocation_count, invocations);
    }

    #[test]
    fn empty_fragments_still_count_as_messages() {
        let mut tally = ExecutionTally::new();
        tally.observe(&BackendEvent::text(""));
        assert_eq!(tally.message_count, 1);
        assert!(tally.is_empty());
    }

    #[test]
    fn tool_activity_is_not_empty() {
        let mut tally = ExecutionTally::new();
        tally.observe(&BackendEvent::tool_invocation("Bash", json!({"command": "ls"})));
        assert!(!tally.is_empty());
    }
}
