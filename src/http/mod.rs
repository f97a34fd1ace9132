//! Storefront HTTP API.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (request id, trace span, timeout, body limit, metrics)
//!     → catalog.rs (product and option reads)
//!     → quote.rs (configure session, quote or submit to cart)
//!     → error.rs (failures as JSON with status)
//! ```

pub mod catalog;
pub mod error;
pub mod quote;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use quote::{CartResponse, QuoteRequest, QuoteResponse};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
