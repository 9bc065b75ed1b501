//! Exposure URL and expiry assignment.

use chrono::{DateTime, Months, TimeDelta, Utc};
use tracing::debug;

use super::credential::ClientCredential;
use crate::asset::Visibility;
use crate::storage::{BlobClient, StorageAccountConfig, StorageError};

/// Validity of a private URL.
pub const PRIVATE_URL_TTL: TimeDelta = TimeDelta::hours(1);

/// Validity of a public URL, in calendar months.
pub const PUBLIC_URL_TTL_MONTHS: u32 = 120;

/// URL handed to the caller for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposure {
    /// Final URL after token, CDN, and container rewrites.
    pub url: String,
    /// When the URL stops being usable.
    pub expires_at: DateTime<Utc>,
    /// Whether the URL carries a per-object signed token.
    pub signed: bool,
}

/// Computes exposures for one storage account.
///
/// Token issuance is delegated to the client; signing is local, so no
/// request reaches the storage service.
#[derive(Debug, Clone, Copy)]
pub struct ExposurePolicy<'a> {
    config: &'a StorageAccountConfig,
}

impl<'a> ExposurePolicy<'a> {
    /// Create a policy for the account.
    #[must_use]
    pub fn new(config: &'a StorageAccountConfig) -> Self {
        Self { config }
    }

    /// Assign the URL and expiry for `key`.
    ///
    /// Public assets get a read-only token valid for ten years. Private
    /// assets get the client's resource URL as is, valid for one hour; for
    /// an access-token client that URL carries the account-level token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SigningUnavailable`] for a public asset when
    /// the credential holds no account key, or the client's error if the
    /// URL cannot be built.
    pub async fn assign(
        &self,
        client: &dyn BlobClient,
        credential: &ClientCredential,
        key: &str,
        visibility: Visibility,
        issued_at: DateTime<Utc>,
    ) -> Result<Exposure, StorageError> {
        let container = self.config.container_name.as_str();

        let (url, expires_at, signed) = match visibility {
            Visibility::Public => {
                if credential.signing_key().is_none() {
                    return Err(StorageError::SigningUnavailable);
                }
                let expires_at = issued_at
                    .checked_add_months(Months::new(PUBLIC_URL_TTL_MONTHS))
                    .ok_or_else(|| StorageError::configuration("public expiry out of range"))?;
                let url = client
                    .signed_read_url(container, key, issued_at, expires_at)
                    .await?;
                (url, expires_at, true)
            }
            Visibility::Private => (
                client.blob_url(container, key)?,
                issued_at + PRIVATE_URL_TTL,
                false,
            ),
        };

        let url = rewrite_cdn(
            &url,
            &self.config.endpoint,
            self.config.cdn_endpoint.as_deref(),
        );
        let url = strip_container_name(
            &url,
            container,
            self.config.strip_container_name_from_url,
        );

        debug!(key, %visibility, signed, %expires_at, "exposure assigned");

        Ok(Exposure {
            url,
            expires_at,
            signed,
        })
    }
}

/// Replace the first occurrence of `endpoint` with `cdn`.
#[must_use]
pub fn rewrite_cdn(url: &str, endpoint: &str, cdn: Option<&str>) -> String {
    match cdn {
        Some(cdn) if !endpoint.is_empty() => url.replacen(endpoint, cdn, 1),
        _ => url.to_string(),
    }
}

/// Replace the first `/{container}/` with `/` when enabled.
#[must_use]
pub fn strip_container_name(url: &str, container: &str, enabled: bool) -> String {
    if !enabled || container.is_empty() {
        return url.to_string();
    }
    url.replacen(&format!("/{container}/"), "/", 1)
}

/// URL without its query string.
#[must_use]
pub fn canonical_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
