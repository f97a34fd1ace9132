//! Keyed, cancellable retry sequences.
//!
//! Each in-flight sequence is a spawned task registered under a request key
//! (e.g. `"options:acuvue-oasys"`). Scheduling again under the same key aborts
//! the older task, and a finished task only delivers its result while its
//! ticket is still the current one for that key. A slow retry for a product
//! the user already navigated away from therefore never overwrites newer
//! state.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;

use crate::resilience::retries::{retry, Fetched, RetryError, RetryPolicy};

/// Identifies one scheduled sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub key: String,
    pub generation: u64,
}

struct InFlight {
    generation: u64,
    handle: AbortHandle,
}

/// Registry of in-flight retry sequences keyed by request identity.
#[derive(Clone, Default)]
pub struct RetryScheduler {
    inflight: Arc<DashMap<String, InFlight>>,
    next_generation: Arc<AtomicU64>,
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a retry sequence for `key`, superseding any sequence already
    /// running under it. `apply` runs only if the sequence is still current
    /// when it completes.
    pub fn schedule<T, E, F, Fut, A>(
        &self,
        key: impl Into<String>,
        policy: RetryPolicy,
        operation: F,
        apply: A,
    ) -> RequestTicket
    where
        T: Send + 'static,
        E: std::fmt::Display + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Fetched<T, E>> + Send + 'static,
        A: FnOnce(Result<Option<T>, RetryError<E>>) + Send + 'static,
    {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = RequestTicket { key: key.clone(), generation };

        let inflight = self.inflight.clone();
        let task_ticket = ticket.clone();

        // Hold the entry lock across spawn + insert so the task cannot finish
        // and look itself up before it is registered.
        let entry = self.inflight.entry(key.clone());
        let task = tokio::spawn(async move {
            let operation_name = task_ticket.key.clone();
            let result = retry(&policy, &operation_name, operation).await;

            let current = inflight
                .remove_if(&task_ticket.key, |_, f| f.generation == task_ticket.generation)
                .is_some();

            if current {
                apply(result);
            } else {
                tracing::debug!(
                    key = %task_ticket.key,
                    generation = task_ticket.generation,
                    "Discarding stale response"
                );
            }
        });

        let fresh = InFlight {
            generation,
            handle: task.abort_handle(),
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(fresh);
                previous.handle.abort();
                tracing::debug!(key = %key, superseded = previous.generation, "Superseded in-flight request");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }

        ticket
    }

    /// Abort the sequence running under `key`, if any.
    pub fn cancel(&self, key: &str) -> bool {
        match self.inflight.remove(key) {
            Some((_, inflight)) => {
                inflight.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether `ticket` still identifies the in-flight sequence for its key.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.inflight
            .get(&ticket.key)
            .map(|f| f.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// Number of sequences still running.
    pub fn pending(&self) -> usize {
        self.inflight.len()
    }
}
