//! Blobgate CLI
//!
//! Uploads and deletes assets using the storage settings from
//! `config/*.toml` and `BLOBGATE__*` environment variables.
//!
//! # Usage
//!
//! ```bash
//! blobgate upload ./logo.png --hash 3f2a-public
//! blobgate delete --hash 3f2a-public --ext .png
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobgate_azure::AzureClientFactory;
use blobgate_core::asset::AssetDescriptor;
use blobgate_core::storage::{AssetStore, StorageAccountConfig};
use blobgate_shared::{AppConfig, LogSettings};

const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Parser)]
#[command(name = "blobgate")]
#[command(version)]
#[command(about = "Store and remove assets in blob storage", long_about = None)]
struct Cli {
    /// Abort the operation after this many seconds
    #[arg(long, global = true, env = "BLOBGATE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print its URL
    Upload {
        /// File to upload
        file: PathBuf,
        /// Content hash naming the asset; include "public" for a public URL
        #[arg(long)]
        hash: String,
        /// Extension with leading dot; taken from the file name by default
        #[arg(long)]
        ext: Option<String>,
        /// MIME type stored with the object
        #[arg(long, default_value = DEFAULT_MIME)]
        mime: String,
    },
    /// Delete an asset and print the URL it had
    Delete {
        /// Content hash naming the asset
        #[arg(long)]
        hash: String,
        /// Extension with leading dot
        #[arg(long, default_value = "")]
        ext: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let account = StorageAccountConfig::from_settings(&config.storage)
        .context("invalid storage settings")?;
    info!(
        account = %account.account,
        container = %account.container_name,
        auth = account.auth.name(),
        "storage configured"
    );
    let store = AssetStore::new(account, AzureClientFactory::new()?);

    match cli.command {
        Commands::Upload {
            file,
            hash,
            ext,
            mime,
        } => {
            let ext = ext.unwrap_or_else(|| extension_of(&file));
            let asset = AssetDescriptor::new(hash, ext, mime);
            let content = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("failed to open {}", file.display()))?;
            let content = ReaderStream::new(content).boxed();

            let stored = with_timeout(cli.timeout_secs, store.upload_stream(&asset, content))
                .await??;
            println!("key:        {}", stored.key);
            println!("url:        {}", stored.url);
            println!("expires_at: {}", stored.expires_at.to_rfc3339());
        }
        Commands::Delete { hash, ext } => {
            let asset = AssetDescriptor::new(hash, ext, DEFAULT_MIME);
            let removed = with_timeout(cli.timeout_secs, store.delete(&asset)).await??;
            println!("key: {}", removed.key);
            println!("url: {}", removed.url);
        }
    }

    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log.filter.as_str().into());

    tracing_subscriber::registry()
        .with(filter)
        .with(log.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!log.json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn with_timeout<F: Future>(secs: Option<u64>, operation: F) -> Result<F::Output> {
    match secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), operation)
            .await
            .with_context(|| format!("operation timed out after {secs}s")),
        None => Ok(operation.await),
    }
}

/// Extension of `path` with a leading dot, or empty.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
