//! Settings error types.

use thiserror::Error;

/// Result type alias using `SettingsError`.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors raised while loading or validating settings.
///
/// All of these are fatal: they are reported once at startup and never
/// retried.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Configuration sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A setting required by the selected mode is absent or blank.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// The authentication mode is not one of the supported modes.
    #[error("unknown authentication mode '{0}' (expected 'default' or 'msi')")]
    UnknownAuthMode(String),

    /// A setting is present but cannot be used.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl SettingsError {
    /// Create an invalid value error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
