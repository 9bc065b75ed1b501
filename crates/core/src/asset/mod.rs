//! Asset descriptors and naming.
//!
//! An [`AssetDescriptor`] is built by the caller for a single operation and
//! dropped afterwards. Results are returned as values, never written back
//! onto the descriptor.

pub mod naming;

#[cfg(test)]
mod naming_props;

pub use naming::{PUBLIC_MARKER, Visibility, is_public, resolve_key};

/// Identity and classification of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    /// Content hash chosen by the caller; also carries the public marker.
    pub content_hash: String,
    /// File extension including the leading dot, e.g. `.png`.
    pub extension: String,
    /// MIME type sent as the object's `Content-Type`.
    pub mime_type: String,
}

impl AssetDescriptor {
    /// Create a new asset descriptor.
    #[must_use]
    pub fn new(
        content_hash: impl Into<String>,
        extension: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            extension: extension.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Public or private, as decided by the naming policy.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        Visibility::of(self)
    }
}
