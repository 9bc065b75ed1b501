//! Azure Blob Storage backend for Blobgate.
//!
//! Implements the [`BlobClient`](blobgate_core::storage::BlobClient) and
//! [`ClientFactory`](blobgate_core::storage::ClientFactory) capabilities on
//! the `azure_storage_blobs` client library.
//!
//! # Modules
//!
//! - `identity` - Managed identity credentials, one per identity
//! - `client` - Containers, block uploads, deletes, and signed read URLs
//! - `factory` - Client construction from a resolved credential

pub mod client;
mod error;
pub mod factory;
pub mod identity;
mod upload;

pub use client::AzureBlobClient;
pub use factory::AzureClientFactory;
pub use identity::{IdentityEndpoint, ManagedIdentityCredentials, STORAGE_SCOPE};
