//! Retried cart writes.

use std::sync::Arc;
use thiserror::Error;

use crate::backend::BackendError;
use crate::cart::{CartLine, CartSink, CartSubmission};
use crate::resilience::{retry, RetryError, RetryPolicy};

#[derive(Debug, Error)]
pub enum CartError {
    /// Retries exhausted; the shopper may try again.
    #[error("cart is unavailable: {0}")]
    Unavailable(#[from] RetryError<BackendError>),

    /// The sink accepted the call but returned no line.
    #[error("cart did not confirm line {0}")]
    Unconfirmed(uuid::Uuid),
}

#[derive(Clone)]
pub struct CartService {
    sink: Arc<dyn CartSink>,
    policy: RetryPolicy,
}

impl CartService {
    pub fn new(sink: Arc<dyn CartSink>, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub async fn add_to_cart(&self, submission: &CartSubmission) -> Result<CartLine, CartError> {
        let line = retry(&self.policy, "cart.insert_line", || self.sink.insert_line(submission)).await?;
        let line = line.ok_or(CartError::Unconfirmed(submission.line_id))?;
        tracing::info!(
            line_id = %line.line_id,
            product = %line.product_id,
            total = line.total_price,
            "Added line to cart"
        );
        Ok(line)
    }
}
