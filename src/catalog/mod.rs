//! Product catalog: row types, sources and the retrying service.

pub mod cache;
pub mod service;
pub mod source;
pub mod static_catalog;
pub mod types;

pub use cache::TtlCache;
pub use service::{CatalogError, CatalogService};
pub use source::CatalogSource;
pub use static_catalog::StaticCatalog;
pub use types::{CustomizationOption, NumericRange, OptionChoice, OptionKind, OptionValue, Product};
