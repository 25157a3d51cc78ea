//! Character-safe truncation helpers.
//!
//! Limits throughout ragchat are expressed in characters (Unicode scalar
//! values), never bytes, so slicing must not split a multi-byte character.

/// Keep the first `max_chars` characters of `text`.
///
/// Returns the input unchanged when it is already short enough.
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Keep the last `max_chars` characters of `text`.
///
/// Returns the input unchanged when it is already short enough.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((byte_idx, _)) => &text[byte_idx..],
        None => "",
    }
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
