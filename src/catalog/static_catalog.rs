//! Catalog held in memory, loaded from a JSON file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::backend::BackendError;
use crate::catalog::source::CatalogSource;
use crate::catalog::types::{CustomizationOption, Product};
use crate::resilience::Fetched;

/// `{"products": [...], "options": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub options: Vec<CustomizationOption>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>, options: Vec<CustomizationOption>) -> Self {
        Self { products, options }
    }

    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let catalog: Self = serde_json::from_reader(reader)?;
        tracing::info!(
            path = ?path,
            products = catalog.products.len(),
            options = catalog.options.len(),
            "Loaded catalog file"
        );
        Ok(catalog)
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_products(&self) -> Fetched<Vec<Product>, BackendError> {
        Fetched::ok(self.products.clone())
    }

    async fn fetch_product(&self, id: &str) -> Fetched<Product, BackendError> {
        match self.products.iter().find(|p| p.id == id) {
            Some(product) => Fetched::ok(product.clone()),
            None => Fetched::empty(),
        }
    }

    async fn fetch_options(&self, product_id: Option<&str>) -> Fetched<Vec<CustomizationOption>, BackendError> {
        let options = self
            .options
            .iter()
            .filter(|o| match (product_id, o.product_id.as_deref()) {
                (None, _) | (_, None) => true,
                (Some(wanted), Some(owner)) => wanted == owner,
            })
            .cloned()
            .collect();
        Fetched::ok(options)
    }
}
