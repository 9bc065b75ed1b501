//! Storage error types.

use blobgate_shared::SettingsError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Key that was not found.
        key: String,
    },

    /// The key cannot be addressed on the service as written.
    #[error("invalid object key {key}: {reason}")]
    InvalidKey {
        /// Offending key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A public URL was requested but the credential cannot sign tokens.
    #[error("credential cannot issue signed-access tokens")]
    SigningUnavailable,

    /// Invalid configuration or credential.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The storage service rejected a request.
    #[error("storage service returned {status}: {message}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Service error message or response body.
        message: String,
    },

    /// The request never got a response.
    #[error("storage request failed: {0}")]
    Http(String),

    /// Reading the upload content failed.
    #[error("content stream failed: {0}")]
    Stream(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP error.
    #[must_use]
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a stream error.
    #[must_use]
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<SettingsError> for StorageError {
    fn from(err: SettingsError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Stream(err.to_string())
    }
}
