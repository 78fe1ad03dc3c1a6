//! Server configuration.
//!
//! Defaults first, then environment variables, then command-line flags. All
//! settings have defaults so the server can start with zero configuration
//! for local development.

use std::path::PathBuf;

use crate::cli::Cli;

const INVENTORY_FILE: &str = "inventory.json";
const PHOTO_DIR: &str = "photos";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host name or IP address the HTTP (axum) API server binds to.
    /// Env: `HTTP_HOST`
    /// Default: `127.0.0.1`
    pub host: String,

    /// Port for the HTTP API server.
    /// Env: `HTTP_PORT`
    /// Default: `3000`
    pub port: u16,

    /// Directory holding the inventory file and the photo directory.
    /// Env: `CACHE_DIR`
    /// Default: `./cache`
    pub cache_dir: PathBuf,

    /// Maximum request body size in bytes (10 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cache_dir: PathBuf::from("./cache"),
            max_upload_size: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HTTP_HOST") {
            if !host.is_empty() {
                config.host = host;
            }
        }

        if let Ok(port) = std::env::var("HTTP_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                config.port = parsed;
            } else {
                tracing::warn!(
                    value = %port,
                    "Invalid HTTP_PORT, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("CACHE_DIR") {
            if !path.is_empty() {
                config.cache_dir = PathBuf::from(path);
            }
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Apply command-line overrides on top of the current settings.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(cache) = &cli.cache {
            self.cache_dir = cache.clone();
        }

        self
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.cache_dir.join(INVENTORY_FILE)
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.cache_dir.join(PHOTO_DIR)
    }
}
