//! History store error types.

/// Convenience alias for history results.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors raised by the history store.
///
/// Enrichment callers never see these: a failing store read degrades the
/// whole batch to `history: None` instead of raising.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Underlying sqlite failure.
    #[error("history store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Status value could not be serialized or parsed.
    #[error("status serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let e = HistoryError::from(rusqlite::Error::InvalidQuery);
        assert!(e.to_string().contains("history store"));
    }
}
