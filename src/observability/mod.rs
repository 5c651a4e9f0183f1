//! Observability for the validation engine
//!
//! - Typed lifecycle events, emitted through `tracing`
//! - Relaxed atomic counters
//!
//! The library never installs a subscriber. Observability is read-only and
//! has no effect on validation results.

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
