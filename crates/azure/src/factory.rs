//! Client construction.

use std::sync::Arc;
use std::time::Duration;

use azure_core::TransportOptions;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::ClientBuilder;
use blobgate_core::access::ClientCredential;
use blobgate_core::storage::{BlobClient, ClientFactory, StorageError};
use tracing::debug;
use url::Url;

use crate::client::AzureBlobClient;
use crate::identity::{IdentityEndpoint, ManagedIdentityCredentials};

/// Builds [`AzureBlobClient`]s sharing one connection pool and one set of
/// managed identity credentials.
#[derive(Debug, Clone)]
pub struct AzureClientFactory {
    http: reqwest::Client,
    identities: Arc<ManagedIdentityCredentials>,
}

impl AzureClientFactory {
    /// Connection timeout of the shared HTTP client.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a factory; managed identity tokens come from the endpoint
    /// found in the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .user_agent(concat!("blobgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::configuration(format!("HTTP client: {e}")))?;
        Ok(Self::with_http_client(http))
    }

    /// Create a factory around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            identities: Arc::new(ManagedIdentityCredentials::new(IdentityEndpoint::from_env())),
        }
    }

    /// Request managed identity tokens from `identity`.
    #[must_use]
    pub fn with_identity_endpoint(mut self, identity: IdentityEndpoint) -> Self {
        self.identities = Arc::new(ManagedIdentityCredentials::new(identity));
        self
    }

    /// Managed identity credentials shared by the clients of this factory.
    #[must_use]
    pub fn identities(&self) -> &ManagedIdentityCredentials {
        &self.identities
    }

    fn storage_credentials(
        &self,
        credential: &ClientCredential,
    ) -> Result<StorageCredentials, StorageError> {
        match credential {
            ClientCredential::AccessToken(token) => StorageCredentials::sas_token(token.as_query())
                .map_err(|e| StorageError::configuration(format!("access token: {e}"))),
            ClientCredential::SharedKey { account, key } => Ok(StorageCredentials::access_key(
                account.clone(),
                key.as_base64().to_string(),
            )),
            ClientCredential::ManagedIdentity { client_id } => Ok(
                StorageCredentials::token_credential(self.identities.get(client_id.as_deref())?),
            ),
        }
    }
}

impl ClientFactory for AzureClientFactory {
    fn create(
        &self,
        credential: &ClientCredential,
        account: &str,
        endpoint: &str,
    ) -> Result<Arc<dyn BlobClient>, StorageError> {
        Url::parse(endpoint).map_err(|e| {
            StorageError::configuration(format!("invalid storage endpoint {endpoint}: {e}"))
        })?;

        let location = CloudLocation::Custom {
            account: account.to_string(),
            uri: endpoint.to_string(),
        };
        let service = ClientBuilder::with_location(location, self.storage_credentials(credential)?)
            .transport(TransportOptions::new(Arc::new(self.http.clone())))
            .blob_service_client();

        let scope = match credential {
            ClientCredential::AccessToken(token) => Some(token.clone()),
            _ => None,
        };
        debug!(account, endpoint, "blob client created");
        Ok(Arc::new(AzureBlobClient::new(
            service,
            scope,
            credential.signing_key().is_some(),
        )))
    }
}
