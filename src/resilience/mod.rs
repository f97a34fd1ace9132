//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Remote load / write:
//!     → retries.rs (invoke, inspect the {data, error} pair)
//!     → On error: backoff.rs (capped exponential delay), then retry
//!     → After max attempts: RetryError with the last failure
//!
//! Product switch while a load is pending:
//!     → scheduler.rs aborts the superseded sequence
//!     → stale results are dropped instead of applied
//! ```

pub mod backoff;
pub mod retries;
pub mod scheduler;

pub use retries::{retry, Fetched, RetryError, RetryPolicy};
pub use scheduler::{RequestTicket, RetryScheduler};
