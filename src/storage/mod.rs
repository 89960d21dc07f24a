//! Event Store subsystem
//!
//! Per-tenant append-only storage of behavioral samples and their outcomes.
//!
//! # Design Principles
//!
//! - One store instance per tenant, never shared
//! - Append-only: outcome changes are new records, samples are never deleted
//! - Checksum-verified on every read of the file backend
//! - Durable write first, in-memory state second

mod errors;
mod event_log;
mod memory;
mod record;
mod sample;
mod store;
mod table;

pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use event_log::{EventLogReader, FileEventStore};
pub use memory::InMemoryEventStore;
pub use record::{EventRecord, OutcomeSet};
pub use sample::{Outcome, OutcomeChange, Sample, SampleId, Signals, TimeWindow};
pub use store::EventStore;
pub use table::SampleTable;
