//! Observability subsystem
//!
//! - Structured logging through `tracing`, JSON lines on stderr
//! - Typed event names carried in every log line
//! - Atomic operational counters
//!
//! # Usage
//!
//! ```ignore
//! use leadscore::observability::{Event, MetricsRegistry, ObservationScope};
//!
//! tracing::info!(event = %Event::LeadScored, tenant_id = "acme", probability = 0.42);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_leads_scored();
//!
//! let scope = ObservationScope::new("TRAINING", "acme");
//! // ... do work ...
//! scope.complete("trained");
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{init_logging, LoggingConfig};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
