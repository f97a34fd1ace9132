//! Startup orchestration.
//!
//! Builds the services the HTTP layer needs from a validated configuration:
//! the catalog source and cart sink (remote backend or local file), the
//! retrying catalog and cart services, and the shared engine.

use arc_swap::ArcSwap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backend::{BackendError, RestBackend};
use crate::cart::{CartService, CartSink, MemoryCart};
use crate::catalog::{CatalogService, CatalogSource, StaticCatalog};
use crate::config::{CatalogSourceKind, StorefrontConfig};
use crate::customization::CustomizationEngine;
use crate::http::AppState;
use crate::resilience::RetryPolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),

    #[error("catalog file {path:?}: {source}")]
    CatalogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog source is 'file' but no path is configured")]
    MissingCatalogPath,
}

/// Wire every service for `config`.
pub fn build_state(config: &StorefrontConfig) -> Result<AppState, StartupError> {
    let (source, sink): (Arc<dyn CatalogSource>, Arc<dyn CartSink>) = match config.catalog.source {
        CatalogSourceKind::Remote => {
            let backend = Arc::new(RestBackend::new(&config.backend)?);
            (backend.clone() as Arc<dyn CatalogSource>, backend as Arc<dyn CartSink>)
        }
        CatalogSourceKind::File => {
            let path = config
                .catalog
                .path
                .as_ref()
                .map(PathBuf::from)
                .ok_or(StartupError::MissingCatalogPath)?;
            let catalog = StaticCatalog::load_from_file(&path)
                .map_err(|source| StartupError::CatalogFile { path, source })?;
            tracing::warn!("Using in-memory cart; lines are lost on restart");
            (
                Arc::new(catalog) as Arc<dyn CatalogSource>,
                Arc::new(MemoryCart::new()) as Arc<dyn CartSink>,
            )
        }
    };

    let policy = RetryPolicy::from(&config.retries);
    tracing::info!(
        max_attempts = policy.max_attempts,
        base_delay_ms = policy.base_delay_ms,
        max_delay_ms = policy.max_delay_ms,
        worst_case_wait = ?policy.worst_case_wait(),
        "Retry policy configured"
    );

    let mut catalog = CatalogService::new(source, policy);
    if config.cache.enabled {
        catalog = catalog.with_cache(Duration::from_secs(config.cache.catalog_ttl_secs));
    }
    let cart = CartService::new(sink, policy);

    let engine = CustomizationEngine::from_profiles(config.quantization.profiles.clone());
    tracing::info!(profiles = engine.registry().len(), "Customization engine ready");

    Ok(AppState::new(
        catalog,
        cart,
        Arc::new(ArcSwap::from_pointee(engine)),
        &config.pricing.currency,
    ))
}
