//! Mapping of client library errors.

use azure_core::error::{Error, ErrorKind};
use blobgate_core::storage::StorageError;

/// HTTP status of a service error response, if the error is one.
pub(crate) fn status_of(err: &Error) -> Option<u16> {
    match err.kind() {
        ErrorKind::HttpResponse { status, .. } => Some(u16::from(*status)),
        _ => None,
    }
}

/// Service error responses become [`StorageError::Transport`] carrying the
/// service error code; everything else is [`StorageError::Http`].
pub(crate) fn storage_error(err: Error) -> StorageError {
    match err.kind() {
        ErrorKind::HttpResponse { status, error_code } => StorageError::transport(
            u16::from(*status),
            error_code.clone().unwrap_or_else(|| err.to_string()),
        ),
        _ => StorageError::http(err.to_string()),
    }
}
