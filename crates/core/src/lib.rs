//! Core access-policy logic for Blobgate.
//!
//! This crate decides how every asset is stored and exposed. It does not
//! speak HTTP: the storage backend is reached through the client traits in
//! [`storage`], implemented by a transport crate.
//!
//! # Modules
//!
//! - `asset` - Asset descriptors, object keys, public/private classification
//! - `access` - Credential selection, signed-access tokens, exposure URLs
//! - `storage` - Account configuration, client capability traits, upload/delete orchestration

pub mod access;
pub mod asset;
pub mod storage;
