//! Text helpers for building bounded classification signals.

/// Collapse runs of whitespace (including separators like `/` already
/// replaced by the caller) into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string to at most `max_chars` characters.
///
/// Operates on `char` counts, not bytes, so multi-byte titles are never
/// split mid-character. Returns a borrowed slice when the input fits.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
