//! Line protocol spoken by the backend process on stdout.
//!
//! One JSON object per line, discriminated by `type`:
//!
//! | `type` | Meaning |
//! |--------|---------|
//! | `text` | `{"text": ".."}` output fragment |
//! | `tool_use` | `{"name": "..", "input": {..}}` |
//! | `tool_result` | `{"name"?, "content": str or blocks, "is_error"?}` |
//! | `assistant` / `user` | `{"message": {"content": [blocks]}}` envelopes |
//! | `result` | terminal; `is_error` or an `error_*` subtype means failed |
//! | `error` | fault, optional HTTP-like `status` |
//! | `tool_error` | fault attributed to a tool provider (`name`, `message`) |
//!
//! Other types (`system`, keep-alives) are ignored.

use fleet_application::BackendError;
use fleet_domain::BackendEvent;
use serde_json::Value;

/// Outcome of parsing one stdout line.
#[derive(Debug, PartialEq)]
pub enum ParsedLine {
    Events(Vec<BackendEvent>),
    Fault(BackendError),
    Ignored,
}

pub fn parse_line(line: &str) -> ParsedLine {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return ParsedLine::Fault(BackendError::Malformed(format!("{}: {}", e, line))),
    };
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return ParsedLine::Fault(BackendError::Malformed(format!(
            "missing type: {}",
            line
        )));
    };

    match kind {
        "text" => ParsedLine::Events(vec![BackendEvent::text(str_field(&value, "text"))]),
        "tool_use" => ParsedLine::Events(vec![tool_use(&value)]),
        "tool_result" => ParsedLine::Events(vec![tool_result(&value)]),
        "assistant" | "user" => ParsedLine::Events(envelope_blocks(&value)),
        "result" => ParsedLine::Events(vec![result(&value)]),
        "error" => ParsedLine::Fault(error(&value)),
        "tool_error" => ParsedLine::Fault(BackendError::ToolProvider {
            tool: str_field(&value, "name"),
            message: str_field(&value, "message"),
        }),
        _ => ParsedLine::Ignored,
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn tool_use(value: &Value) -> BackendEvent {
    BackendEvent::tool_invocation(
        str_field(value, "name"),
        value.get("input").cloned().unwrap_or(Value::Null),
    )
}

fn tool_result(value: &Value) -> BackendEvent {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(String::from);
    let is_error = value
        .get("is_error")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    BackendEvent::tool_result(name, content_text(value.get("content")), is_error)
}

/// Tool result content is either a plain string or a list of text blocks.
fn content_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn envelope_blocks(value: &Value) -> Vec<BackendEvent> {
    let Some(blocks) = value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| match block.get("type").and_then(Value::as_str) {
            Some("text") => Some(BackendEvent::text(str_field(block, "text"))),
            Some("tool_use") => Some(tool_use(block)),
            Some("tool_result") => Some(tool_result(block)),
            _ => None,
        })
        .collect()
}

fn result(value: &Value) -> BackendEvent {
    let is_error = value
        .get("is_error")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let subtype = value
        .get("subtype")
        .and_then(Value::as_str)
        .unwrap_or("success");

    if is_error || subtype.starts_with("error") {
        let message = value
            .get("result")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(subtype);
        BackendEvent::failed(message)
    } else {
        BackendEvent::completed()
    }
}

fn error(value: &Value) -> BackendError {
    // Either {"message": ..} or {"error": {"message": ..}}
    let detail = value.get("error").unwrap_or(value);
    let message = detail
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .unwrap_or("unspecified backend error")
        .to_string();
    let status = value
        .get("status")
        .or_else(|| detail.get("status"))
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok());
    BackendError::Rejected { status, message }
}
