//! Application configuration management.
//!
//! Storage settings are deliberately text-typed: values arrive from config
//! files and environment variables, are trimmed, and are only checked for
//! presence here. Typed validation happens when the storage layer builds its
//! account configuration from them.

use std::fmt;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Storage account settings.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

/// Storage account settings, as supplied by the operator.
#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    /// Authentication mode: `default` (shared key) or `msi` (managed identity).
    pub auth_type: Option<String>,
    /// Managed identity client id.
    pub client_id: Option<String>,
    /// Storage account name.
    pub account: Option<String>,
    /// Shared key secret (base64).
    pub account_key: Option<String>,
    /// Pre-issued account-level access token used for private objects.
    pub sas_token: Option<String>,
    /// Blob service base URL override.
    pub service_base_url: Option<String>,
    /// Container holding all assets.
    pub container_name: Option<String>,
    /// Path prefix prepended to every object key.
    #[serde(default = "default_path")]
    pub default_path: String,
    /// Create the container on upload if it does not exist.
    #[serde(default)]
    pub create_container_if_not_exist: bool,
    /// Public access level for created containers: `blob`, `container`, or anything else for none.
    pub public_access_type: Option<String>,
    /// CDN base URL replacing the service base URL in exposed URLs.
    pub cdn_base_url: Option<String>,
    /// `Cache-Control` applied to uploaded objects.
    pub default_cache_control: Option<String>,
    /// Remove `/{container}/` from exposed URLs.
    #[serde(default)]
    pub remove_container_name: bool,
    /// Upload chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// Maximum number of chunks in flight per upload.
    #[serde(default = "default_max_concurrent_chunks")]
    pub max_concurrent_chunks: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            auth_type: None,
            client_id: None,
            account: None,
            account_key: None,
            sas_token: None,
            service_base_url: None,
            container_name: None,
            default_path: default_path(),
            create_container_if_not_exist: false,
            public_access_type: None,
            cdn_base_url: None,
            default_cache_control: None,
            remove_container_name: false,
            chunk_size_bytes: default_chunk_size(),
            max_concurrent_chunks: default_max_concurrent_chunks(),
        }
    }
}

fn default_path() -> String {
    "assets".to_string()
}

fn default_chunk_size() -> usize {
    4 * 1024 * 1024 // 4 MiB
}

fn default_max_concurrent_chunks() -> usize {
    20
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("auth_type", &self.auth_type)
            .field("client_id", &self.client_id)
            .field("account", &self.account)
            .field("account_key", &self.account_key.as_ref().map(|_| "<redacted>"))
            .field("sas_token", &self.sas_token.as_ref().map(|_| "<redacted>"))
            .field("service_base_url", &self.service_base_url)
            .field("container_name", &self.container_name)
            .field("default_path", &self.default_path)
            .field(
                "create_container_if_not_exist",
                &self.create_container_if_not_exist,
            )
            .field("public_access_type", &self.public_access_type)
            .field("cdn_base_url", &self.cdn_base_url)
            .field("default_cache_control", &self.default_cache_control)
            .field("remove_container_name", &self.remove_container_name)
            .field("chunk_size_bytes", &self.chunk_size_bytes)
            .field("max_concurrent_chunks", &self.max_concurrent_chunks)
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "blobgate=info".to_string()
}

/// Trim a text setting, treating blank values as absent.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `BLOBGATE__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BLOBGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
