//! Upload and delete orchestration.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use tracing::{debug, info};

use super::client::{BlobClient, ByteStream, ClientFactory, ContainerStatus, UploadOptions};
use super::config::StorageAccountConfig;
use super::error::StorageError;
use crate::access::exposure::canonical_url;
use crate::access::{ClientCredential, CredentialResolver, ExposurePolicy};
use crate::asset::{AssetDescriptor, resolve_key};

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Object key within the container.
    pub key: String,
    /// URL handed to the caller.
    pub url: String,
    /// When `url` stops being usable.
    pub expires_at: DateTime<Utc>,
    /// Whether `url` carries a per-object signed token.
    pub signed: bool,
}

/// Result of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedAsset {
    /// Object key within the container.
    pub key: String,
    /// Canonical URL the object had: no query, no CDN rewrite.
    pub url: String,
}

/// Stores and removes assets in one storage account.
///
/// Cheap to clone and safe to share across tasks.
pub struct AssetStore<F> {
    config: Arc<StorageAccountConfig>,
    factory: Arc<F>,
}

impl<F> Clone for AssetStore<F> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F: ClientFactory> AssetStore<F> {
    /// Create a store for the account.
    #[must_use]
    pub fn new(config: StorageAccountConfig, factory: F) -> Self {
        Self {
            config: Arc::new(config),
            factory: Arc::new(factory),
        }
    }

    /// Account configuration.
    #[must_use]
    pub fn config(&self) -> &StorageAccountConfig {
        &self.config
    }

    /// Upload in-memory content.
    ///
    /// # Errors
    ///
    /// See [`AssetStore::upload_stream`].
    pub async fn upload(
        &self,
        asset: &AssetDescriptor,
        content: Bytes,
    ) -> Result<StoredAsset, StorageError> {
        let content: ByteStream = stream::once(async move { Ok(content) }).boxed();
        self.upload_stream(asset, content).await
    }

    /// Upload streamed content and return its exposure URL.
    ///
    /// An existing object with the same key is replaced. The URL is computed
    /// before the transfer and discarded if the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built, the container cannot
    /// be created, a public URL cannot be signed, or the transfer fails.
    pub async fn upload_stream(
        &self,
        asset: &AssetDescriptor,
        content: ByteStream,
    ) -> Result<StoredAsset, StorageError> {
        let visibility = asset.visibility();
        let (credential, client) = self.client_for(asset)?;
        let key = resolve_key(&self.config.default_path_prefix, asset);
        let container = self.config.container_name.as_str();

        if self.config.create_container_if_missing {
            let status = client
                .create_container(container, self.config.container_public_access.declared())
                .await?;
            if status == ContainerStatus::Created {
                info!(
                    container,
                    access = self.config.container_public_access.as_str(),
                    "container created"
                );
            }
        }

        let exposure = ExposurePolicy::new(&self.config)
            .assign(client.as_ref(), &credential, &key, visibility, Utc::now())
            .await?;

        let options = UploadOptions {
            chunk_size: self.config.transfer.chunk_size_bytes,
            max_concurrency: self.config.transfer.max_concurrent_chunks,
            content_type: asset.mime_type.clone(),
            cache_control: self.config.default_cache_control.clone(),
        };
        client
            .upload_stream(container, &key, content, &options)
            .await?;

        info!(
            container,
            key = %key,
            %visibility,
            auth = credential.kind(),
            expires_at = %exposure.expires_at,
            "asset uploaded"
        );

        Ok(StoredAsset {
            key,
            url: exposure.url,
            expires_at: exposure.expires_at,
            signed: exposure.signed,
        })
    }

    /// Delete an asset and return the URL it had.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the object does not exist, or
    /// another error if the client cannot be built or the request fails.
    pub async fn delete(&self, asset: &AssetDescriptor) -> Result<RemovedAsset, StorageError> {
        let (credential, client) = self.client_for(asset)?;
        let key = resolve_key(&self.config.default_path_prefix, asset);
        let container = self.config.container_name.as_str();

        let url = canonical_url(&client.blob_url(container, &key)?).to_string();
        client.delete_blob(container, &key).await?;

        info!(container, key = %key, auth = credential.kind(), "asset deleted");

        Ok(RemovedAsset { key, url })
    }

    fn client_for(
        &self,
        asset: &AssetDescriptor,
    ) -> Result<(ClientCredential, Arc<dyn BlobClient>), StorageError> {
        let visibility = asset.visibility();
        let credential = CredentialResolver::resolve(&self.config, visibility);
        debug!(
            hash = %asset.content_hash,
            %visibility,
            auth = credential.kind(),
            "credential resolved"
        );
        let client = self.factory.create(
            &credential,
            &self.config.account,
            &self.config.endpoint,
        )?;
        Ok((credential, client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessToken, AccountKey};
    use crate::storage::client::{MockBlobClient, MockClientFactory, fake_blob_client};
    use crate::storage::config::{AuthMode, PublicAccessLevel};
    use chrono::{Months, TimeDelta};
    use futures::TryStreamExt;
    use url::form_urlencoded;

    const ENDPOINT: &str = "https://acct.blob.core.windows.net";

    fn key() -> AccountKey {
        AccountKey::from_base64("c2VjcmV0LWtleQ==").expect("valid base64")
    }

    fn shared_key_config(token: Option<&str>) -> StorageAccountConfig {
        StorageAccountConfig::new(
            "acct",
            AuthMode::SharedKey {
                secret: key(),
                pre_signed_access_token: token.and_then(AccessToken::parse),
            },
            "media",
        )
    }

    fn managed_identity_config() -> StorageAccountConfig {
        StorageAccountConfig::new("acct", AuthMode::ManagedIdentity { client_id: None }, "media")
    }

    fn png(hash: &str) -> AssetDescriptor {
        AssetDescriptor::new(hash, ".png", "image/png")
    }

    fn client(scope: Option<&'static str>) -> MockBlobClient {
        match scope {
            None => fake_blob_client(ENDPOINT),
            Some(query) => {
                let mut client = MockBlobClient::new();
                client.expect_blob_url().returning(move |container, key| {
                    Ok(format!("{ENDPOINT}/{container}/{key}?{query}"))
                });
                client
            }
        }
    }

    fn factory_for(client: MockBlobClient, expected: ClientCredential) -> MockClientFactory {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .withf(move |credential, account, endpoint| {
                *credential == expected && account == "acct" && endpoint == ENDPOINT
            })
            .times(1)
            .return_once(move |_, _, _| Ok(Arc::new(client) as Arc<dyn BlobClient>));
        factory
    }

    fn shared_key_credential() -> ClientCredential {
        ClientCredential::SharedKey {
            account: "acct".into(),
            key: key(),
        }
    }

    fn param(url: &str, name: &str) -> Option<String> {
        let (_, query) = url.split_once('?')?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[tokio::test]
    async fn test_public_upload_is_signed() {
        let mut client = client(None);
        client
            .expect_upload_stream()
            .withf(|container, key, _, options| {
                container == "media"
                    && key == "assets/h-public.png"
                    && options.content_type == "image/png"
                    && options.chunk_size == 4 * 1024 * 1024
                    && options.max_concurrency == 20
                    && options.cache_control.is_none()
            })
            .times(1)
            .returning(|_, _, content, _| {
                let chunks: Vec<Bytes> =
                    futures::executor::block_on(content.try_collect()).expect("stream");
                assert_eq!(chunks.concat(), b"hello".to_vec());
                Ok(())
            });
        client.expect_create_container().never();

        let store = AssetStore::new(
            shared_key_config(None),
            factory_for(client, shared_key_credential()),
        );

        let before = Utc::now();
        let stored = store
            .upload(&png("h-public"), Bytes::from_static(b"hello"))
            .await
            .expect("upload");
        let after = Utc::now();

        assert_eq!(stored.key, "assets/h-public.png");
        assert!(stored.signed);
        assert!(stored.url.starts_with(&format!("{ENDPOINT}/media/assets/h-public.png?")));
        assert_eq!(param(&stored.url, "sp").as_deref(), Some("r"));
        assert!(param(&stored.url, "sig").is_some());
        assert!(param(&stored.url, "se").is_some());

        let ten_years = Months::new(120);
        assert!(stored.expires_at >= before.checked_add_months(ten_years).expect("in range"));
        assert!(stored.expires_at <= after.checked_add_months(ten_years).expect("in range"));
    }

    #[tokio::test]
    async fn test_private_upload_with_token_uses_access_token() {
        let mut client = client(Some("sv=1&sig=acct"));
        client
            .expect_upload_stream()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let expected =
            ClientCredential::AccessToken(AccessToken::parse("sv=1&sig=acct").expect("token"));

        let store = AssetStore::new(
            shared_key_config(Some("?sv=1&sig=acct")),
            factory_for(client, expected),
        );

        let before = Utc::now();
        let stored = store
            .upload(&png("h"), Bytes::from_static(b"x"))
            .await
            .expect("upload");

        assert!(!stored.signed);
        assert_eq!(stored.url, format!("{ENDPOINT}/media/assets/h.png?sv=1&sig=acct"));
        let ttl = stored.expires_at - before;
        assert!(ttl >= TimeDelta::hours(1));
        assert!(ttl < TimeDelta::hours(1) + TimeDelta::seconds(5));
    }

    #[tokio::test]
    async fn test_private_upload_with_default_identity() {
        let mut client = client(None);
        client
            .expect_upload_stream()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let store = AssetStore::new(
            managed_identity_config(),
            factory_for(client, ClientCredential::ManagedIdentity { client_id: None }),
        );

        let stored = store
            .upload(&png("abc"), Bytes::from_static(b"x"))
            .await
            .expect("upload");
        assert_eq!(stored.url, format!("{ENDPOINT}/media/assets/abc.png"));
        assert!(!stored.url.contains('?'));
        assert!(!stored.signed);
    }

    #[tokio::test]
    async fn test_public_upload_without_signing_key_transfers_nothing() {
        let mut client = client(None);
        client.expect_upload_stream().never();

        let store = AssetStore::new(
            managed_identity_config(),
            factory_for(client, ClientCredential::ManagedIdentity { client_id: None }),
        );

        let err = store
            .upload(&png("h-public"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SigningUnavailable));
    }

    #[tokio::test]
    async fn test_container_created_with_declared_access() {
        let mut client = client(None);
        client
            .expect_create_container()
            .withf(|container, access| {
                container == "media" && *access == Some(PublicAccessLevel::Blob)
            })
            .times(1)
            .returning(|_, _| Ok(ContainerStatus::Created));
        client
            .expect_upload_stream()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let config = shared_key_config(None).with_container_creation(PublicAccessLevel::Blob);
        let store = AssetStore::new(config, factory_for(client, shared_key_credential()));

        store
            .upload(&png("h-public"), Bytes::new())
            .await
            .expect("upload");
    }

    #[tokio::test]
    async fn test_existing_private_container_is_success() {
        let mut client = client(None);
        client
            .expect_create_container()
            .withf(|_, access| access.is_none())
            .times(1)
            .returning(|_, _| Ok(ContainerStatus::AlreadyExists));
        client
            .expect_upload_stream()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let config = shared_key_config(None).with_container_creation(PublicAccessLevel::None);
        let store = AssetStore::new(config, factory_for(client, shared_key_credential()));

        assert!(store.upload(&png("h"), Bytes::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_cdn_and_cache_control_applied_to_upload() {
        let mut client = client(None);
        client
            .expect_upload_stream()
            .withf(|_, _, _, options| options.cache_control.as_deref() == Some("max-age=3600"))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let config = shared_key_config(None)
            .with_cdn_endpoint("https://cdn.example.com")
            .with_cache_control("max-age=3600")
            .with_container_name_stripped();
        let store = AssetStore::new(config, factory_for(client, shared_key_credential()));

        let stored = store
            .upload(&png("h-public"), Bytes::new())
            .await
            .expect("upload");
        assert!(
            stored
                .url
                .starts_with("https://cdn.example.com/assets/h-public.png?")
        );
    }

    #[tokio::test]
    async fn test_transfer_failure_propagates() {
        let mut client = client(None);
        client
            .expect_upload_stream()
            .times(1)
            .returning(|_, _, _, _| Err(StorageError::transport(403, "AuthorizationFailure")));

        let store = AssetStore::new(
            shared_key_config(None),
            factory_for(client, shared_key_credential()),
        );

        let err = store
            .upload(&png("h"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Transport { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_factory_failure_propagates() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .returning(|_, _, _| Err(StorageError::configuration("bad credential")));

        let store = AssetStore::new(shared_key_config(None), factory);
        let err = store
            .upload(&png("h"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_delete_returns_canonical_url() {
        let mut client = client(Some("sv=1&sig=acct"));
        client
            .expect_delete_blob()
            .withf(|container, key| container == "media" && key == "assets/h.png")
            .times(1)
            .returning(|_, _| Ok(()));
        let expected =
            ClientCredential::AccessToken(AccessToken::parse("sv=1&sig=acct").expect("token"));

        let config = shared_key_config(Some("sv=1&sig=acct"))
            .with_cdn_endpoint("https://cdn.example.com")
            .with_container_name_stripped();
        let store = AssetStore::new(config, factory_for(client, expected));

        let removed = store.delete(&png("h")).await.expect("delete");
        assert_eq!(removed.key, "assets/h.png");
        assert_eq!(removed.url, format!("{ENDPOINT}/media/assets/h.png"));
    }

    #[tokio::test]
    async fn test_delete_missing_object_is_not_found() {
        let mut client = client(None);
        client
            .expect_delete_blob()
            .returning(|_, key| Err(StorageError::not_found(key)));

        let store = AssetStore::new(
            shared_key_config(None),
            factory_for(client, shared_key_credential()),
        );

        let err = store.delete(&png("h-public")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_rejected_key_sends_nothing() {
        let mut client = MockBlobClient::new();
        client
            .expect_blob_url()
            .returning(|_, key| Err(StorageError::invalid_key(key, "dot segment")));
        client.expect_delete_blob().never();

        let config = shared_key_config(None).with_path_prefix("assets/..");
        let store = AssetStore::new(config, factory_for(client, shared_key_credential()));

        let err = store.delete(&png("h")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { ref key, .. } if key == "assets/../h.png"));
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AssetStore<MockClientFactory>>();
    }
}
