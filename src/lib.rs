//! Contact lens storefront: option configurator, pricing and a resilient
//! data-loading layer, served over an HTTP API.

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod customization;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::StorefrontConfig;
pub use customization::{ConfiguratorSession, CustomizationEngine};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
