//! Product customization: option seeding, snapping and pricing.
//!
//! # Data Flow
//! ```text
//! Product + CustomizationOption[] (from catalog)
//!     → engine.rs initialize (seed SelectionState from defaults)
//!     → engine.rs set_value (quantize.rs snaps profile-bound numerics)
//!     → engine.rs compute_total / quote (base price + adjustments)
//!     → engine.rs validate → session.rs submission → cart
//! ```

pub mod engine;
pub mod error;
pub mod quantize;
pub mod selection;
pub mod session;

pub use engine::{CustomizationEngine, LineAdjustment, PriceBreakdown};
pub use error::{IssueReason, OptionIssue, ValidationError};
pub use quantize::{ProfileRegistry, QuantizationProfile};
pub use selection::SelectionState;
pub use session::{ConfiguratorSession, SubmissionError};
