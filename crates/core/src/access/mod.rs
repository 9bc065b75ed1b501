//! Credential selection and exposure URLs.
//!
//! ```text
//! ┌────────────────────┐   ClientCredential   ┌──────────────────────┐
//! │ CredentialResolver │ ───────────────────▶ │ ClientFactory        │
//! └────────────────────┘                      └──────────────────────┘
//!           ▲ Visibility                                 │ BlobClient
//!           │                                            ▼
//! ┌────────────────────┐   key, Visibility    ┌──────────────────────┐
//! │ naming policy      │ ───────────────────▶ │ ExposurePolicy       │
//! └────────────────────┘                      └──────────────────────┘
//! ```
//!
//! Public URLs are signed by the [`BlobClient`](crate::storage::BlobClient)
//! that holds the account key.

pub mod credential;
pub mod exposure;

#[cfg(test)]
mod exposure_props;

pub use credential::{AccessToken, AccountKey, ClientCredential, CredentialResolver};
pub use exposure::{Exposure, ExposurePolicy, PRIVATE_URL_TTL, PUBLIC_URL_TTL_MONTHS};
