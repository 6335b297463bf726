//! Error types for invite-core.

use thiserror::Error;

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set (or was blank).
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },

    /// An environment variable was set but could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Convenience constructor for [`ConfigError::Invalid`].
pub(crate) fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
