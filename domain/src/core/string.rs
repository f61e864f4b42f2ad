//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries. The result never exceeds `max_len` bytes;
/// limits too small for the ellipsis get a bare prefix.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    if max_len < 3 {
        return s[..floor_char_boundary(s, max_len)].to_string();
    }
    format!("{}...", &s[..floor_char_boundary(s, max_len - 3)])
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut end = index.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// First line of a possibly multi-line string, truncated to `max_len`.
///
/// Used for one-line previews of prompts and tool payloads in logs.
pub fn preview(s: &str, max_len: usize) -> String {
    let first = s.lines().next().unwrap_or("");
    if first.len() < s.trim_end().len() {
        truncate(&format!("{first} ..."), max_len)
    } else {
        truncate(first, max_len)
    }
}
