//! # inventory-server
//!
//! HTTP service for a small device inventory.
//!
//! This binary provides:
//! - **REST API** (axum) to register, list, search, update and delete
//!   inventory items
//! - **Photo storage**: one optional photo per item, uploaded as multipart
//!   and served back unchanged
//! - **JSON persistence**: the whole inventory is rewritten to a single file
//!   in the cache directory after every change

mod api;
mod cli;
mod config;
mod error;
mod service;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use inventory_store::{InventoryRepository, JsonFile, PhotoStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::cli::Cli;
use crate::config::ServerConfig;
use crate::service::InventoryService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,inventory_server=debug,inventory_store=debug")
        }))
        .init();

    info!("Starting inventory server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration (defaults < env < flags)
    // -----------------------------------------------------------------------
    let cli = Cli::parse();
    let config = ServerConfig::from_env().with_cli(&cli);
    info!(?config, "Loaded configuration");

    std::fs::create_dir_all(&config.cache_dir).with_context(|| {
        format!(
            "failed to create cache directory '{}'",
            config.cache_dir.display()
        )
    })?;

    // -----------------------------------------------------------------------
    // 3. Initialize storage
    // -----------------------------------------------------------------------
    let photos = PhotoStore::new(config.photo_dir())
        .await
        .context("failed to initialize photo store")?;

    // Never fails: a broken inventory file degrades to an empty collection
    let repo = InventoryRepository::load(JsonFile::new(config.inventory_path()));

    let (host, port) = (config.host.clone(), config.port);
    let app_state = AppState {
        inventory: Arc::new(InventoryService::new(repo, photos)),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, &host, port) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
