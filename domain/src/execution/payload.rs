//! Best-effort extraction of a JSON object from free-form model output.
//!
//! Agents are often asked to "answer in JSON", but models wrap the object in
//! prose or code fences. The extractor takes the span from the first `{` to
//! the last `}` and parses it. Failure is not an error: the structured payload
//! is derived data and its absence says nothing about whether the run
//! succeeded.

use serde_json::Value;

/// Extract the JSON object spanning the first `{` to the last `}` of `text`.
///
/// Returns `None` when no such span exists or it does not parse as an object.
/// Pure function of its input, so repeated calls agree.
pub fn extract_json_payload(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_bare_object() {
        let payload = extract_json_payload(r#"{"revenue": 1200, "currency": "EUR"}"#);
        assert_eq!(payload, Some(json!({"revenue": 1200, "currency": "EUR"})));
    }

    #[test]
    fn extracts_object_wrapped_in_prose_and_fences() {
        let text = "Here is the summary:\n```json\n{\"posts\": [\"a\", \"b\"]}\n```\nDone.";
        assert_eq!(extract_json_payload(text), Some(json!({"posts": ["a", "b"]})));
    }

    #[test]
    fn spans_first_open_to_last_close() {
        // Nested objects are kept whole
        let text = r#"result: {"outer": {"inner": 1}} trailing"#;
        assert_eq!(
            extract_json_payload(text),
            Some(json!({"outer": {"inner": 1}}))
        );
    }

    #[test]
    fn absent_without_braces() {
        assert_eq!(extract_json_payload("42"), None);
        assert_eq!(extract_json_payload(""), None);
    }

    #[test]
    fn absent_when_braces_reversed() {
        assert_eq!(extract_json_payload("} nothing here {"), None);
    }

    #[test]
    fn absent_when_span_does_not_parse() {
        // Two separate objects: first '{' .. last '}' is not valid JSON
        assert_eq!(extract_json_payload(r#"{"a": 1} and {"b": 2}"#), None);
        assert_eq!(extract_json_payload("{not json}"), None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let inputs = [
            r#"prefix {"k": [1, 2, 3]} suffix"#,
            "{broken",
            "plain text",
            r#"{"a": 1} and {"b": 2}"#,
        ];
        for text in inputs {
            assert_eq!(extract_json_payload(text), extract_json_payload(text));
        }
    }
}
