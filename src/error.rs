//! Configuration and setup errors
//!
//! Nothing in the per-tick simulation can fail; these only come out of
//! settings loading and setup-time configuration calls.

/// Errors raised while loading or applying configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("shape table mismatch: {positions} positions but {scales} scale factors")]
    ShapeLengthMismatch { positions: usize, scales: usize },
    #[error("shape table needs at least 2 points, got {0}")]
    ShapeTooShort(usize),
    #[error("settings file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
