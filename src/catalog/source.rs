//! Where catalog rows come from.

use async_trait::async_trait;

use crate::backend::BackendError;
use crate::catalog::types::{CustomizationOption, Product};
use crate::resilience::Fetched;

/// Raw catalog reads. Implementations report failures in the pair rather
/// than retrying themselves; [`CatalogService`](crate::catalog::CatalogService)
/// owns retry and caching.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> Fetched<Vec<Product>, BackendError>;

    /// `data` is `None` when no product has `id`.
    async fn fetch_product(&self, id: &str) -> Fetched<Product, BackendError>;

    /// Options for `product_id` plus catalog-wide options, or every option
    /// when `product_id` is `None`.
    async fn fetch_options(&self, product_id: Option<&str>) -> Fetched<Vec<CustomizationOption>, BackendError>;
}
