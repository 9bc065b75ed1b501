//! Asset storage against a blob storage account.
//!
//! The core decides credentials, keys, and URLs; the actual HTTP traffic is
//! delegated to a [`BlobClient`] built by a [`ClientFactory`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          AssetStore                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ upload(asset, bytes)          │ delete(asset)                   │
//! │ upload_stream(asset, stream)  │                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ ClientFactory::create(credential, account, endpoint)            │
//! │ create_container │ upload_stream │ delete_blob                  │
//! │ blob_url │ signed_read_url                                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod error;
mod service;

#[cfg(test)]
pub(crate) use client::fake_blob_client;
#[cfg(test)]
pub use client::{MockBlobClient, MockClientFactory};
pub use client::{BlobClient, ByteStream, ClientFactory, ContainerStatus, UploadOptions};
pub use config::{AuthKind, AuthMode, PublicAccessLevel, StorageAccountConfig, TransferTuning};
pub use error::StorageError;
pub use service::{AssetStore, RemovedAsset, StoredAsset};
