//! In-process cart used by file-backed deployments and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::BackendError;
use crate::cart::{CartLine, CartSink, CartSubmission};
use crate::resilience::Fetched;

#[derive(Clone, Default)]
pub struct MemoryCart {
    lines: Arc<DashMap<Uuid, CartSubmission>>,
}

impl MemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored submission for `line_id`.
    pub fn get(&self, line_id: &Uuid) -> Option<CartSubmission> {
        self.lines.get(line_id).map(|r| r.value().clone())
    }

    /// Number of stored lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[async_trait]
impl CartSink for MemoryCart {
    async fn insert_line(&self, submission: &CartSubmission) -> Fetched<CartLine, BackendError> {
        let stored = self
            .lines
            .entry(submission.line_id)
            .or_insert_with(|| submission.clone());
        Fetched::ok(CartLine::from(stored.value()))
    }
}
