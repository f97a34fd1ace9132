//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the storefront API
//! - Wire up middleware (request id, tracing, timeout, body limit, metrics)
//! - Serve on a listener until shutdown is signalled

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::config::ListenerConfig;
use crate::customization::CustomizationEngine;
use crate::http::request::{request_span, track_metrics, X_REQUEST_ID};
use crate::http::{catalog, quote};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub cart: CartService,
    /// Replaced wholesale when quantization profiles are reloaded.
    pub engine: Arc<ArcSwap<CustomizationEngine>>,
    pub currency: Arc<str>,
}

impl AppState {
    pub fn new(
        catalog: CatalogService,
        cart: CartService,
        engine: Arc<ArcSwap<CustomizationEngine>>,
        currency: &str,
    ) -> Self {
        Self {
            catalog,
            cart,
            engine,
            currency: Arc::from(currency),
        }
    }
}

/// HTTP server for the storefront API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(listener: &ListenerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(listener, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/products", get(catalog::list_products))
            .route("/products/{id}", get(catalog::get_product))
            .route("/products/{id}/options", get(catalog::list_options))
            .route("/quote", post(quote::create_quote))
            .route("/cart", post(quote::add_to_cart));

        Router::new()
            .route("/health", get(health))
            .nest("/api/v1", api)
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// The router, for serving on a custom listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
