/// Convenience result type used across flycart.
pub type FlycartResult<T> = Result<T, FlycartError>;

/// Top-level error taxonomy used by orchestrator and config APIs.
///
/// Stale batch signals are deliberately absent: they are not errors.
#[derive(thiserror::Error, Debug)]
pub enum FlycartError {
    /// Invalid trigger input or easing parameters. Nothing was created.
    #[error("validation error: {0}")]
    Validation(String),

    /// The orchestrator was disposed before the call.
    #[error("orchestrator is disposed")]
    Disposed,

    /// Unreadable or malformed configuration document.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlycartError {
    /// Build a [`FlycartError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlycartError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for FlycartError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
