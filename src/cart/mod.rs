//! Cart submission.
//!
//! The configurator hands a validated [`CartSubmission`] to [`CartService`],
//! which writes it through a [`CartSink`] under the retry policy. Each
//! submission carries a client-generated `line_id`, so a retried insert that
//! actually landed the first time is deduplicated by the sink.

pub mod memory;
pub mod service;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::BackendError;
use crate::customization::selection::SelectionState;
use crate::resilience::Fetched;

/// Payload handed to "add to cart".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSubmission {
    pub line_id: Uuid,
    pub product_id: String,
    pub selections: SelectionState,
    pub total_price: f64,
}

impl CartSubmission {
    pub fn new(product_id: String, selections: SelectionState, total_price: f64) -> Self {
        Self {
            line_id: Uuid::new_v4(),
            product_id,
            selections,
            total_price,
        }
    }
}

/// Cart row as confirmed by the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: Uuid,
    pub product_id: String,
    pub total_price: f64,
}

impl From<&CartSubmission> for CartLine {
    fn from(submission: &CartSubmission) -> Self {
        Self {
            line_id: submission.line_id,
            product_id: submission.product_id.clone(),
            total_price: submission.total_price,
        }
    }
}

/// Destination of cart lines.
#[async_trait]
pub trait CartSink: Send + Sync {
    /// Insert (or confirm an existing) line for `submission`.
    async fn insert_line(&self, submission: &CartSubmission) -> Fetched<CartLine, BackendError>;
}

pub use memory::MemoryCart;
pub use service::{CartError, CartService};
