//! Settings and shared error types for Blobgate.
//!
//! This crate provides what every other crate needs before any storage
//! request is made:
//! - Text-typed storage settings as they arrive from files and environment
//! - Layered configuration loading
//! - Settings validation errors

pub mod config;
pub mod error;

pub use config::{AppConfig, LogSettings, StorageSettings, non_empty};
pub use error::{SettingsError, SettingsResult};
