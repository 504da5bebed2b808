//! String utilities for the domain layer.

/// Shorten `s` to at most `max_len` bytes, ending in `...` when cut.
///
/// The cut always lands on a UTF-8 character boundary, so department notes
/// written in any script can be embedded in reasoning text and prompts.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3).min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Join items with `", "`, or return `fallback` when there are none.
pub fn join_or<I, S>(items: I, fallback: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    if parts.is_empty() {
        fallback.to_string()
    } else {
        parts.join(", ")
    }
}
