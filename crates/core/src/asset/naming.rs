//! Object keys and public/private classification.

use std::fmt;

use super::AssetDescriptor;

/// Substring of a content hash that marks the asset as public.
pub const PUBLIC_MARKER: &str = "public";

/// Whether an asset is exposed through a long-lived signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Long-lived, per-object signed URL.
    Public,
    /// Short-lived URL relying on account-level access.
    Private,
}

impl Visibility {
    /// Classify an asset.
    #[must_use]
    pub fn of(asset: &AssetDescriptor) -> Self {
        if is_public(asset) {
            Self::Public
        } else {
            Self::Private
        }
    }

    /// Returns true for [`Visibility::Public`].
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Private => "private",
        })
    }
}

/// Object key within the container: `{prefix}/{hash}{extension}`.
///
/// Slashes are not normalized; a prefix with a trailing slash yields `//`.
#[must_use]
pub fn resolve_key(path_prefix: &str, asset: &AssetDescriptor) -> String {
    format!("{path_prefix}/{}{}", asset.content_hash, asset.extension)
}

/// Case-sensitive, unanchored search for [`PUBLIC_MARKER`] in the content hash.
#[must_use]
pub fn is_public(asset: &AssetDescriptor) -> bool {
    asset.content_hash.contains(PUBLIC_MARKER)
}
