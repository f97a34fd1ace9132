//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! storefront.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all issues reported)
//!     → StorefrontConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs reloads and validates
//!     → quantization profiles swapped into the shared engine
//! ```

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackendConfig, CacheConfig, CatalogConfig, CatalogSourceKind, ListenerConfig, LogFormat,
    ObservabilityConfig, PricingConfig, QuantizationConfig, RetryConfig, StorefrontConfig,
};
pub use validation::{validate_config, ConfigIssue};
