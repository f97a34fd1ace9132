//! Client for the hosted backend's REST interface.
//!
//! Tables are read with PostgREST-style filters (`?id=eq.p1`). Every call
//! resolves to a [`Fetched`] pair; retry is left to the caller.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::backend::BackendError;
use crate::cart::{CartLine, CartSink, CartSubmission};
use crate::catalog::source::CatalogSource;
use crate::catalog::types::{CustomizationOption, Product};
use crate::config::BackendConfig;
use crate::customization::selection::SelectionState;
use crate::resilience::Fetched;

const PRODUCTS: &str = "products";
const OPTIONS: &str = "customization_options";
const CART_ITEMS: &str = "cart_items";

/// Row written to `cart_items`.
#[derive(Debug, Serialize)]
struct CartRow<'a> {
    line_id: uuid::Uuid,
    product_id: &'a str,
    customizations: &'a SelectionState,
    total_price: f64,
}

#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    rest_base: String,
    api_key: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| BackendError::Transport(format!("invalid base URL '{}': {}", config.base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let rest_base = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            config.rest_path.trim_matches('/')
        );
        tracing::info!(endpoint = %rest_base, "Backend client initialized");

        Ok(Self {
            client,
            rest_base,
            api_key: config.api_key.clone(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.rest_base, name)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            return request;
        }
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, String)]) -> Result<Vec<T>, BackendError> {
        let request = self.client.get(self.table(table)).query(filters);
        let response = self.send(request).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for RestBackend {
    async fn fetch_products(&self) -> Fetched<Vec<Product>, BackendError> {
        self.select::<Product>(PRODUCTS, &[("select", "*".to_string())]).await.into()
    }

    async fn fetch_product(&self, id: &str) -> Fetched<Product, BackendError> {
        let filters = [("select", "*".to_string()), ("id", format!("eq.{}", id))];
        match self.select::<Product>(PRODUCTS, &filters).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(product) => Fetched::ok(product),
                None => Fetched::empty(),
            },
            Err(e) => Fetched::err(e),
        }
    }

    async fn fetch_options(&self, product_id: Option<&str>) -> Fetched<Vec<CustomizationOption>, BackendError> {
        let mut filters = vec![("select", "*".to_string()), ("order", "order.asc,id.asc".to_string())];
        if let Some(id) = product_id {
            filters.push(("or", product_options_filter(id)));
        }
        self.select::<CustomizationOption>(OPTIONS, &filters).await.into()
    }
}

#[async_trait]
impl CartSink for RestBackend {
    async fn insert_line(&self, submission: &CartSubmission) -> Fetched<CartLine, BackendError> {
        let row = CartRow {
            line_id: submission.line_id,
            product_id: &submission.product_id,
            customizations: &submission.selections,
            total_price: submission.total_price,
        };
        // Upsert on line_id so a replayed insert returns the existing row.
        let request = self
            .client
            .post(self.table(CART_ITEMS))
            .query(&[("on_conflict", "line_id")])
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(&[row]);

        let result = match self.send(request).await {
            Ok(response) => response
                .json::<Vec<CartLine>>()
                .await
                .map_err(|e| BackendError::Decode(e.to_string())),
            Err(e) => Err(e),
        };
        match result {
            Ok(rows) => match rows.into_iter().next() {
                Some(line) => Fetched::ok(line),
                None => Fetched::empty(),
            },
            Err(e) => Fetched::err(e),
        }
    }
}

/// `or` filter matching options of `product_id` plus shared ones. The id is
/// quoted so reserved characters cannot alter the filter.
fn product_options_filter(product_id: &str) -> String {
    let escaped = product_id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("(product_id.eq.\"{}\",product_id.is.null)", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, rest_path: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            rest_path: rest_path.to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_table_urls() {
        let backend = RestBackend::new(&config("http://localhost:54321/", "/rest/v1/")).unwrap();
        assert_eq!(backend.table(PRODUCTS), "http://localhost:54321/rest/v1/products");

        let backend = RestBackend::new(&config("https://shop.example.com", "rest/v1")).unwrap();
        assert_eq!(
            backend.table(OPTIONS),
            "https://shop.example.com/rest/v1/customization_options"
        );
    }

    #[test]
    fn test_options_filter_quotes_product_id() {
        assert_eq!(
            product_options_filter("daily-comfort"),
            r#"(product_id.eq."daily-comfort",product_id.is.null)"#
        );
        assert_eq!(
            product_options_filter("x,product_id.not.is.null"),
            r#"(product_id.eq."x,product_id.not.is.null",product_id.is.null)"#
        );
        assert_eq!(
            product_options_filter(r#"a"b\c"#),
            r#"(product_id.eq."a\"b\\c",product_id.is.null)"#
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RestBackend::new(&config("not a url", "/rest/v1")),
            Err(BackendError::Transport(_))
        ));
    }

    #[test]
    fn test_cart_row_shape() {
        let selections = SelectionState::new().with("power", 500.0.into());
        let row = CartRow {
            line_id: uuid::Uuid::nil(),
            product_id: "p1",
            customizations: &selections,
            total_price: 120.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["customizations"]["power"], 500.0);
        assert_eq!(json["product_id"], "p1");
    }
}
