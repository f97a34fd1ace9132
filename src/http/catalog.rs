//! Read-only catalog endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::catalog::types::{CustomizationOption, Product};
use crate::http::error::ApiError;
use crate::http::server::AppState;

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.load_products().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.load_product(&id).await?))
}

/// Options for a product, in display order. Unknown products are 404.
pub async fn list_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CustomizationOption>>, ApiError> {
    let (_, options) = state.catalog.load_configurable(&id).await?;
    Ok(Json(options))
}
