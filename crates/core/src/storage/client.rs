//! Capabilities the core needs from a blob storage client.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use super::config::PublicAccessLevel;
use super::error::StorageError;
use crate::access::ClientCredential;

/// Upload content as a stream of byte chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Parameters of a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Bytes per transferred chunk.
    pub chunk_size: usize,
    /// Chunks in flight at once.
    pub max_concurrency: usize,
    /// `Content-Type` stored with the object.
    pub content_type: String,
    /// `Cache-Control` stored with the object.
    pub cache_control: Option<String>,
}

/// Outcome of a container creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// The container was created by this request.
    Created,
    /// The container existed already.
    AlreadyExists,
}

/// Client bound to one storage endpoint and one credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Resource URL of a blob, including any query the client scopes its
    /// requests with.
    ///
    /// Fails for a key the service would address differently than written.
    fn blob_url(&self, container: &str, key: &str) -> Result<String, StorageError>;

    /// Blob URL carrying a read-only signed-access token valid between
    /// `starts_on` and `expires_on`.
    ///
    /// Only clients holding the account key can sign; others return
    /// [`StorageError::SigningUnavailable`].
    async fn signed_read_url(
        &self,
        container: &str,
        key: &str,
        starts_on: DateTime<Utc>,
        expires_on: DateTime<Utc>,
    ) -> Result<String, StorageError>;

    /// Create a container, declaring `access` when given.
    async fn create_container(
        &self,
        container: &str,
        access: Option<PublicAccessLevel>,
    ) -> Result<ContainerStatus, StorageError>;

    /// Store the stream under `key`, replacing any existing object.
    async fn upload_stream(
        &self,
        container: &str,
        key: &str,
        content: ByteStream,
        options: &UploadOptions,
    ) -> Result<(), StorageError>;

    /// Delete a blob. A missing blob is [`StorageError::NotFound`].
    async fn delete_blob(&self, container: &str, key: &str) -> Result<(), StorageError>;
}

/// Builds clients for a credential.
#[cfg_attr(test, mockall::automock)]
pub trait ClientFactory: Send + Sync {
    /// Create a client for `account` at `endpoint` authenticating with
    /// `credential`.
    fn create(
        &self,
        credential: &ClientCredential,
        account: &str,
        endpoint: &str,
    ) -> Result<Arc<dyn BlobClient>, StorageError>;
}

/// Mock client addressing blobs under `endpoint`, signing read URLs with a
/// fixed signature over the requested window.
#[cfg(test)]
pub(crate) fn fake_blob_client(endpoint: &str) -> MockBlobClient {
    use chrono::SecondsFormat;

    let mut client = MockBlobClient::new();
    let base = endpoint.to_string();
    client
        .expect_blob_url()
        .returning(move |container, key| Ok(format!("{base}/{container}/{key}")));
    let base = endpoint.to_string();
    client
        .expect_signed_read_url()
        .returning(move |container, key, starts_on, expires_on| {
            Ok(format!(
                "{base}/{container}/{key}?sv=2022-11-02&st={}&se={}&sr=b&sp=r&sig=c2lnbmF0dXJl",
                starts_on.to_rfc3339_opts(SecondsFormat::Secs, true),
                expires_on.to_rfc3339_opts(SecondsFormat::Secs, true),
            ))
        });
    client
}
