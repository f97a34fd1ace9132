//! Lens storefront service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http (axum) ──▶ customization engine (snap, price, validate)
//!                    │
//!                    ├──▶ catalog service ──▶ retry ──▶ CatalogSource ──▶ backend REST / JSON file
//!                    │         └─ TTL cache
//!                    └──▶ cart service ────▶ retry ──▶ CartSink ──────▶ backend REST / memory
//!
//!     config (toml, hot-reloaded profiles) · observability (tracing, metrics) · lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use lens_storefront::config::{load_config, watcher, StorefrontConfig};
use lens_storefront::http::HttpServer;
use lens_storefront::lifecycle::{build_state, wait_for_signal, Shutdown};
use lens_storefront::observability::{logging, metrics};

const CONFIG_ENV: &str = "STOREFRONT_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => StorefrontConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("lens-storefront v{} starting", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => tracing::info!(path = ?path, "Configuration loaded"),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = build_state(&config)?;
    let shutdown = Shutdown::new();

    let purge_every = Duration::from_secs(config.cache.catalog_ttl_secs.max(1));
    if state.catalog.spawn_purge_task(purge_every, shutdown.signalled()).is_some() {
        tracing::debug!(every = ?purge_every, "Catalog cache purge scheduled");
    }

    // Keep the watcher handle alive for the lifetime of the server.
    let _watcher = match &config_path {
        Some(path) => {
            let (config_watcher, updates) = watcher::ConfigWatcher::new(path);
            match config_watcher.run() {
                Ok(handle) => {
                    let engine = Arc::clone(&state.engine);
                    let stopped = shutdown.signalled();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = watcher::apply_reloads(updates, engine) => {}
                            _ = stopped => {}
                        }
                    });
                    Some(handle)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        catalog_source = ?config.catalog.source,
        "Listening for connections"
    );

    let signals = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signals.trigger();
    });

    let server = HttpServer::new(&config.listener, state);
    server.run(listener, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
