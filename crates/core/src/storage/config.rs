//! Storage account configuration types.

use blobgate_shared::{SettingsError, SettingsResult, StorageSettings, non_empty};
use tracing::warn;
use url::Url;

use crate::access::{AccessToken, AccountKey};

/// How the gateway authenticates against the storage account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Account name and shared-key secret.
    SharedKey {
        /// Shared-key secret.
        secret: AccountKey,
        /// Pre-issued account-level token, used for private assets.
        pre_signed_access_token: Option<AccessToken>,
    },
    /// Platform identity service.
    ManagedIdentity {
        /// Specific identity; the default identity when `None`.
        client_id: Option<String>,
    },
}

impl AuthMode {
    /// Parse the text form used in settings.
    ///
    /// Returns `None` for unknown modes.
    #[must_use]
    pub fn parse_kind(raw: &str) -> Option<AuthKind> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "default" | "shared_key" | "sharedkey" => Some(AuthKind::SharedKey),
            "msi" | "managed_identity" | "managedidentity" => Some(AuthKind::ManagedIdentity),
            _ => None,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SharedKey { .. } => "shared_key",
            Self::ManagedIdentity { .. } => "managed_identity",
        }
    }
}

/// Authentication mode without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// See [`AuthMode::SharedKey`].
    SharedKey,
    /// See [`AuthMode::ManagedIdentity`].
    ManagedIdentity,
}

/// Anonymous read access declared on containers this gateway creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublicAccessLevel {
    /// Private container.
    #[default]
    None,
    /// Anonymous read of blobs, no listing.
    Blob,
    /// Anonymous read and listing.
    Container,
}

impl PublicAccessLevel {
    /// Parse the text form used in settings.
    ///
    /// Anything other than exactly `blob` or `container` means a private
    /// container.
    #[must_use]
    pub fn from_setting(raw: Option<&str>) -> Self {
        match non_empty(raw) {
            Some("blob") => Self::Blob,
            Some("container") => Self::Container,
            _ => Self::None,
        }
    }

    /// Value to declare when creating a container, `None` for a private one.
    #[must_use]
    pub fn declared(self) -> Option<Self> {
        match self {
            Self::None => None,
            level => Some(level),
        }
    }

    /// Wire value of the level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Blob => "blob",
            Self::Container => "container",
        }
    }
}

/// Chunking parameters for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTuning {
    /// Bytes per chunk.
    pub chunk_size_bytes: usize,
    /// Chunks in flight at once.
    pub max_concurrent_chunks: usize,
}

impl TransferTuning {
    /// Default chunk size: 4 MiB.
    pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
    /// Default concurrency: 20 chunks.
    pub const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 20;
}

impl Default for TransferTuning {
    fn default() -> Self {
        Self {
            chunk_size_bytes: Self::DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: Self::DEFAULT_MAX_CONCURRENT_CHUNKS,
        }
    }
}

/// Storage account configuration, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccountConfig {
    /// Storage account name.
    pub account: String,
    /// Authentication mode.
    pub auth: AuthMode,
    /// Blob service base URL, without trailing slash.
    pub endpoint: String,
    /// Container holding all assets.
    pub container_name: String,
    /// Prefix of every object key.
    pub default_path_prefix: String,
    /// CDN base URL, without trailing slash.
    pub cdn_endpoint: Option<String>,
    /// `Cache-Control` for uploaded objects.
    pub default_cache_control: Option<String>,
    /// Create the container before uploading.
    pub create_container_if_missing: bool,
    /// Access level declared when creating the container.
    pub container_public_access: PublicAccessLevel,
    /// Remove `/{container}/` from exposed URLs.
    pub strip_container_name_from_url: bool,
    /// Upload chunking.
    pub transfer: TransferTuning,
}

impl StorageAccountConfig {
    /// Default key prefix.
    pub const DEFAULT_PATH_PREFIX: &'static str = "assets";

    /// Create a configuration with default settings.
    #[must_use]
    pub fn new(account: impl Into<String>, auth: AuthMode, container: impl Into<String>) -> Self {
        let account = account.into();
        Self {
            endpoint: Self::default_endpoint(&account),
            account,
            auth,
            container_name: container.into(),
            default_path_prefix: Self::DEFAULT_PATH_PREFIX.to_string(),
            cdn_endpoint: None,
            default_cache_control: None,
            create_container_if_missing: false,
            container_public_access: PublicAccessLevel::None,
            strip_container_name_from_url: false,
            transfer: TransferTuning::default(),
        }
    }

    /// Blob service URL derived from the account name, in the form the
    /// client reports it (lowercase host, no trailing slash).
    #[must_use]
    pub fn default_endpoint(account: &str) -> String {
        let raw = format!("https://{account}.blob.core.windows.net");
        normalize_base_url("account", &raw).unwrap_or(raw)
    }

    /// Build from operator settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth mode is unknown, a setting required by
    /// the mode is missing, or a URL, key, or tuning value is malformed.
    pub fn from_settings(settings: &StorageSettings) -> SettingsResult<Self> {
        let account = non_empty(settings.account.as_deref())
            .ok_or(SettingsError::Missing("account"))?;
        if !account.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SettingsError::invalid(
                "account",
                "only letters and digits are allowed",
            ));
        }
        let account = account.to_ascii_lowercase();
        let container = non_empty(settings.container_name.as_deref())
            .ok_or(SettingsError::Missing("container_name"))?;

        let auth = Self::auth_from_settings(settings)?;

        let endpoint = match non_empty(settings.service_base_url.as_deref()) {
            Some(raw) => normalize_base_url("service_base_url", raw)?,
            None => Self::default_endpoint(&account),
        };
        let cdn_endpoint = non_empty(settings.cdn_base_url.as_deref())
            .map(|raw| normalize_base_url("cdn_base_url", raw))
            .transpose()?;

        if settings.chunk_size_bytes == 0 {
            return Err(SettingsError::invalid("chunk_size_bytes", "must be non-zero"));
        }
        if settings.max_concurrent_chunks == 0 {
            return Err(SettingsError::invalid(
                "max_concurrent_chunks",
                "must be non-zero",
            ));
        }

        Ok(Self {
            account,
            auth,
            endpoint,
            container_name: container.to_string(),
            default_path_prefix: settings.default_path.trim().to_string(),
            cdn_endpoint,
            default_cache_control: non_empty(settings.default_cache_control.as_deref())
                .map(String::from),
            create_container_if_missing: settings.create_container_if_not_exist,
            container_public_access: PublicAccessLevel::from_setting(
                settings.public_access_type.as_deref(),
            ),
            strip_container_name_from_url: settings.remove_container_name,
            transfer: TransferTuning {
                chunk_size_bytes: settings.chunk_size_bytes,
                max_concurrent_chunks: settings.max_concurrent_chunks,
            },
        })
    }

    fn auth_from_settings(settings: &StorageSettings) -> SettingsResult<AuthMode> {
        let raw = non_empty(settings.auth_type.as_deref()).unwrap_or("default");
        let kind = AuthMode::parse_kind(raw)
            .ok_or_else(|| SettingsError::UnknownAuthMode(raw.to_string()))?;

        match kind {
            AuthKind::SharedKey => {
                let encoded = non_empty(settings.account_key.as_deref())
                    .ok_or(SettingsError::Missing("account_key"))?;
                let secret = AccountKey::from_base64(encoded)
                    .map_err(|e| SettingsError::invalid("account_key", e.to_string()))?;
                Ok(AuthMode::SharedKey {
                    secret,
                    pre_signed_access_token: settings
                        .sas_token
                        .as_deref()
                        .and_then(AccessToken::parse),
                })
            }
            AuthKind::ManagedIdentity => {
                if non_empty(settings.account_key.as_deref()).is_some() {
                    warn!("account_key is ignored with managed identity authentication");
                }
                Ok(AuthMode::ManagedIdentity {
                    client_id: non_empty(settings.client_id.as_deref()).map(String::from),
                })
            }
        }
    }

    /// Set the service base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize_or_trim(endpoint.into());
        self
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_path_prefix = prefix.into();
        self
    }

    /// Set the CDN base URL.
    #[must_use]
    pub fn with_cdn_endpoint(mut self, cdn: impl Into<String>) -> Self {
        self.cdn_endpoint = Some(normalize_or_trim(cdn.into()));
        self
    }

    /// Set the `Cache-Control` for uploads.
    #[must_use]
    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        self.default_cache_control = Some(value.into());
        self
    }

    /// Create the container on upload, declaring the given access level.
    #[must_use]
    pub fn with_container_creation(mut self, access: PublicAccessLevel) -> Self {
        self.create_container_if_missing = true;
        self.container_public_access = access;
        self
    }

    /// Remove `/{container}/` from exposed URLs.
    #[must_use]
    pub fn with_container_name_stripped(mut self) -> Self {
        self.strip_container_name_from_url = true;
        self
    }

    /// Set upload chunking.
    #[must_use]
    pub fn with_transfer(mut self, transfer: TransferTuning) -> Self {
        self.transfer = transfer;
        self
    }
}

/// Parse an absolute base URL and drop the trailing slash.
fn normalize_base_url(field: &'static str, raw: &str) -> SettingsResult<String> {
    let url = Url::parse(raw).map_err(|e| SettingsError::invalid(field, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(SettingsError::invalid(field, "not a base URL"));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn normalize_or_trim(raw: String) -> String {
    normalize_base_url("endpoint", &raw)
        .unwrap_or_else(|_| raw.trim_end_matches('/').to_string())
}
