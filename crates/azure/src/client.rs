//! Blob service client.

use async_trait::async_trait;
use azure_storage::shared_access_signature::service_sas::BlobSasPermissions;
use azure_storage_blobs::prelude::{BlobServiceClient, PublicAccess};
use blobgate_core::access::AccessToken;
use blobgate_core::storage::{
    BlobClient, ByteStream, ContainerStatus, PublicAccessLevel, StorageError, UploadOptions,
};
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{status_of, storage_error};
use crate::upload::{block_id, block_list, rechunk};

/// Client for one Blob service endpoint and one credential.
#[derive(Debug, Clone)]
pub struct AzureBlobClient {
    service: BlobServiceClient,
    scope: Option<AccessToken>,
    can_sign: bool,
}

impl AzureBlobClient {
    /// Wrap a service client.
    ///
    /// `scope` is the pre-issued token the service client authenticates
    /// with, repeated on every URL handed out. `can_sign` tells whether the
    /// service client holds the account key.
    #[must_use]
    pub fn new(service: BlobServiceClient, scope: Option<AccessToken>, can_sign: bool) -> Self {
        Self {
            service,
            scope,
            can_sign,
        }
    }

    /// Client for one blob.
    ///
    /// Keys with `.` or `..` segments are refused: URL parsing would resolve
    /// them and address a different object than the key names.
    fn blob(
        &self,
        container: &str,
        key: &str,
    ) -> Result<azure_storage_blobs::prelude::BlobClient, StorageError> {
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(StorageError::invalid_key(
                key,
                "'.' and '..' segments are not addressable",
            ));
        }
        Ok(self.service.container_client(container).blob_client(key))
    }
}

fn offset_date_time(at: DateTime<Utc>) -> Result<OffsetDateTime, StorageError> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| StorageError::configuration(format!("token time {at}: {e}")))
}

fn public_access(level: PublicAccessLevel) -> PublicAccess {
    match level {
        PublicAccessLevel::None => PublicAccess::None,
        PublicAccessLevel::Blob => PublicAccess::Blob,
        PublicAccessLevel::Container => PublicAccess::Container,
    }
}

#[async_trait]
impl BlobClient for AzureBlobClient {
    fn blob_url(&self, container: &str, key: &str) -> Result<String, StorageError> {
        let mut url = self.blob(container, key)?.url().map_err(storage_error)?;
        if let Some(token) = &self.scope {
            url.set_query(Some(token.as_query()));
        }
        Ok(url.into())
    }

    async fn signed_read_url(
        &self,
        container: &str,
        key: &str,
        starts_on: DateTime<Utc>,
        expires_on: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        if !self.can_sign {
            return Err(StorageError::SigningUnavailable);
        }
        let blob = self.blob(container, key)?;
        let permissions = BlobSasPermissions {
            read: true,
            ..BlobSasPermissions::default()
        };

        let signature = blob
            .shared_access_signature(permissions, offset_date_time(expires_on)?)
            .await
            .map_err(storage_error)?
            .start(offset_date_time(starts_on)?);
        let url = blob
            .generate_signed_blob_url(&signature)
            .map_err(storage_error)?;
        Ok(url.into())
    }

    async fn create_container(
        &self,
        container: &str,
        access: Option<PublicAccessLevel>,
    ) -> Result<ContainerStatus, StorageError> {
        let mut request = self.service.container_client(container).create();
        if let Some(access) = access {
            request = request.public_access(public_access(access));
        }

        match request.await {
            Ok(_) => Ok(ContainerStatus::Created),
            Err(err) if status_of(&err) == Some(409) => {
                debug!(container, "container already exists");
                Ok(ContainerStatus::AlreadyExists)
            }
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn upload_stream(
        &self,
        container: &str,
        key: &str,
        content: ByteStream,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        let blob = self.blob(container, key)?;

        let blocks = rechunk(content, options.chunk_size)
            .enumerate()
            .map(|(index, chunk)| {
                let blob = blob.clone();
                async move {
                    blob.put_block(block_id(index), chunk?)
                        .await
                        .map_err(storage_error)?;
                    Ok::<_, StorageError>(index)
                }
            })
            .buffer_unordered(options.max_concurrency.max(1))
            .try_fold(0usize, |count, _| async move { Ok(count + 1) })
            .await?;

        debug!(container, key, blocks, "committing block list");
        let mut commit = blob
            .put_block_list(block_list(blocks))
            .content_type(options.content_type.clone());
        if let Some(cache_control) = &options.cache_control {
            commit = commit.cache_control(cache_control.clone());
        }
        commit.await.map_err(storage_error)?;
        Ok(())
    }

    async fn delete_blob(&self, container: &str, key: &str) -> Result<(), StorageError> {
        match self.blob(container, key)?.delete().await {
            Ok(_) => Ok(()),
            Err(err) if status_of(&err) == Some(404) => Err(StorageError::not_found(key)),
            Err(err) => Err(storage_error(err)),
        }
    }
}
