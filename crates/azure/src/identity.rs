//! Managed identity credentials.
//!
//! Tokens are requested and cached by the identity client library; this
//! module picks the endpoint and keeps one credential per identity so the
//! cache survives across operations.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::{Arc, Mutex};

use azure_core::Url;
use azure_core::auth::TokenCredential;
use azure_core::headers::HeaderName;
use azure_identity::{ImdsId, ImdsManagedIdentityCredential, TokenCredentialOptions};
use blobgate_core::storage::StorageError;
use tracing::debug;

/// Token scope for the Blob service.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

const API_VERSION: &str = "2019-08-01";
const SECRET_HEADER: HeaderName = HeaderName::from_static("x-identity-header");
const SECRET_ENV: &str = "IDENTITY_HEADER";

/// Where identity tokens are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoint {
    url: String,
}

impl IdentityEndpoint {
    /// Instance metadata service address.
    pub const IMDS_URL: &'static str = "http://169.254.169.254/metadata/identity/oauth2/token";

    /// Instance metadata service of a virtual machine.
    #[must_use]
    pub fn imds() -> Self {
        Self {
            url: Self::IMDS_URL.to_string(),
        }
    }

    /// App Service identity endpoint. Requests carry the `IDENTITY_HEADER`
    /// secret from the environment.
    #[must_use]
    pub fn app_service(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// App Service endpoint when `IDENTITY_ENDPOINT` is set, the instance
    /// metadata service otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        env::var("IDENTITY_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(Self::imds, Self::app_service)
    }

    /// Token request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn credential(&self, client_id: Option<&str>) -> Result<Arc<dyn TokenCredential>, StorageError> {
        let url = Url::parse(&self.url).map_err(|e| {
            StorageError::configuration(format!("invalid identity endpoint {}: {e}", self.url))
        })?;
        let id = client_id.map_or(ImdsId::SystemAssigned, |id| ImdsId::ClientId(id.to_string()));
        Ok(Arc::new(ImdsManagedIdentityCredential::new(
            TokenCredentialOptions::default(),
            url,
            API_VERSION,
            SECRET_HEADER,
            SECRET_ENV,
            id,
        )))
    }
}

/// One token credential per identity, shared by every client built for it.
pub struct ManagedIdentityCredentials {
    endpoint: IdentityEndpoint,
    credentials: Mutex<HashMap<Option<String>, Arc<dyn TokenCredential>>>,
}

impl ManagedIdentityCredentials {
    /// Create an empty set of credentials served by `endpoint`.
    #[must_use]
    pub fn new(endpoint: IdentityEndpoint) -> Self {
        Self {
            endpoint,
            credentials: Mutex::new(HashMap::new()),
        }
    }

    /// Endpoint tokens are requested from.
    #[must_use]
    pub fn endpoint(&self) -> &IdentityEndpoint {
        &self.endpoint
    }

    /// Credential for `client_id`, or for the default identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity endpoint URL is malformed.
    pub fn get(&self, client_id: Option<&str>) -> Result<Arc<dyn TokenCredential>, StorageError> {
        let mut credentials = self
            .credentials
            .lock()
            .map_err(|_| StorageError::configuration("identity credential cache poisoned"))?;

        let id = client_id.map(String::from);
        if let Some(credential) = credentials.get(&id) {
            return Ok(Arc::clone(credential));
        }

        let credential = self.endpoint.credential(client_id)?;
        debug!(
            endpoint = %self.endpoint.url,
            client_id = client_id.unwrap_or("default"),
            "identity credential created"
        );
        credentials.insert(id, Arc::clone(&credential));
        Ok(credential)
    }
}

impl fmt::Debug for ManagedIdentityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.credentials.lock().map_or(0, |credentials| credentials.len());
        f.debug_struct("ManagedIdentityCredentials")
            .field("endpoint", &self.endpoint)
            .field("cached", &cached)
            .finish()
    }
}
