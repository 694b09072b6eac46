use crate::traits::Message;

/// Longest provider error body kept in an `AiError::Api`.
pub(crate) const MAX_ERROR_BODY_BYTES: usize = 1000;

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// The last `n` messages of a conversation, oldest first.
pub fn last_turns(history: &[Message], n: usize) -> Vec<Message> {
    let start = history.len().saturating_sub(n);
    history[start..].to_vec()
}
