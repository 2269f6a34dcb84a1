//! Engine error types.

use tabsense_models::ModelError;

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised during tab classification.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The tab's text signal was too short to classify meaningfully.
    #[error("no usable text signal for tab")]
    NoSignal,

    /// A required pipeline has not reached `ready`. Classification fails
    /// rather than substituting a fabricated distribution.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Classification is switched off in settings.
    #[error("classification disabled by settings")]
    Disabled,

    /// Lifecycle or inference failure from the model layer.
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_passes_through_display() {
        let e = EngineError::from(ModelError::NotReady("classifier".into()));
        assert!(e.to_string().contains("classifier"));
    }

    #[test]
    fn no_signal_display() {
        assert!(EngineError::NoSignal.to_string().contains("signal"));
    }
}
