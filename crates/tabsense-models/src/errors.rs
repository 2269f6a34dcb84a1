//! Model lifecycle and inference error types.

/// Convenience alias for model results.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by the model lifecycle manager and inference runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// The caller asked for a model key that is not in the registry.
    /// Rejected immediately; no descriptor is created or mutated.
    #[error("unknown model key: {0}")]
    UnknownModel(String),

    /// A pipeline was requested before its model reached `ready`.
    #[error("model not ready: {0}")]
    NotReady(String),

    /// Required model artifacts are missing from the local artifact root.
    /// The runtime never downloads; missing files are a terminal load error.
    #[error("model artifacts missing: {0}")]
    ArtifactMissing(String),

    /// Runtime session creation or inference failure.
    #[error("inference runtime error: {0}")]
    Runtime(String),

    /// Internal failure (task join, serialization).
    #[error("internal error: {0}")]
    Internal(String),
}
