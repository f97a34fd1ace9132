//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every section
//! has defaults so an empty file yields a runnable configuration.

use serde::{Deserialize, Serialize};

use crate::customization::quantize::QuantizationProfile;

/// Root configuration for the storefront service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorefrontConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Hosted REST backend (catalog rows, cart items).
    pub backend: BackendConfig,

    /// Retry/backoff for every remote call.
    pub retries: RetryConfig,

    /// Catalog cache settings.
    pub cache: CacheConfig,

    /// Where the catalog comes from.
    pub catalog: CatalogConfig,

    /// Quantization profiles for numeric options.
    pub quantization: QuantizationConfig,

    /// Pricing display settings.
    pub pricing: PricingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed per API request in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 45,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Hosted backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. "https://project.example.co".
    pub base_url: String,

    /// Path prefix of the REST interface.
    pub rest_path: String,

    /// Anonymous API key sent as `apikey` and bearer token.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            rest_path: "/rest/v1".to_string(),
            api_key: String::new(),
            request_timeout_secs: 5,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation, the first call included.
    pub max_attempts: u32,

    /// Delay after the first failure in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,

    /// Cap on any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Extra random delay as a fraction of the computed delay (0.0 = none).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            jitter_ratio: 0.0,
        }
    }
}

/// Catalog cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Lifetime of cached catalog reads in seconds.
    pub catalog_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            catalog_ttl_secs: 300,
        }
    }
}

/// Catalog source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSourceKind {
    /// Rows fetched from the hosted backend.
    #[default]
    Remote,
    /// A local JSON file (demo and offline use).
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,

    /// JSON catalog path, required when `source = "file"`.
    pub path: Option<String>,
}

/// Quantization profiles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuantizationConfig {
    pub profiles: Vec<QuantizationProfile>,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            profiles: vec![QuantizationProfile::lens_power()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    /// ISO currency code attached to quotes.
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: StorefrontConfig = toml::from_str("").unwrap();
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.retries.base_delay_ms, 1000);
        assert_eq!(config.retries.max_delay_ms, 5000);
        assert_eq!(config.catalog.source, CatalogSourceKind::Remote);
        assert_eq!(config.quantization.profiles.len(), 1);
        assert_eq!(config.quantization.profiles[0].name, "lens_power");
    }

    #[test]
    fn test_partial_sections() {
        let config: StorefrontConfig = toml::from_str(
            r#"
            [retries]
            max_attempts = 5

            [catalog]
            source = "file"
            path = "catalog.json"

            [[quantization.profiles]]
            name = "cylinder"
            threshold = 200.0
            fine_step = 25.0
            coarse_step = 50.0
            option_names = ["Cylinder Power"]

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.retries.max_attempts, 5);
        assert_eq!(config.retries.base_delay_ms, 1000);
        assert_eq!(config.catalog.source, CatalogSourceKind::File);
        assert_eq!(config.catalog.path.as_deref(), Some("catalog.json"));
        assert_eq!(config.quantization.profiles.len(), 1);
        assert_eq!(config.quantization.profiles[0].option_names, vec!["Cylinder Power"]);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
