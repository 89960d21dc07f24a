//! Event store contract
//!
//! One instance per tenant. Reads are answered from the in-memory
//! [`SampleTable`]; backends differ only in how mutations are made durable.

use super::errors::StorageResult;
use super::sample::{Outcome, OutcomeChange, Sample, SampleId, Signals, TimeWindow};
use super::table::SampleTable;
use crate::errors::LeadResult;

/// Per-tenant append-only store of behavioral samples
pub trait EventStore: Send {
    /// The tenant's current sample table
    fn table(&self) -> &SampleTable;

    /// Appends an unlabeled sample and returns it with its assigned id.
    fn append(&mut self, signals: Signals) -> StorageResult<Sample>;

    /// Sets a terminal outcome.
    ///
    /// Same value again is a no-op; a different terminal value overwrites.
    /// Fails with `LeadNotFound` for unknown ids.
    fn set_outcome(&mut self, id: SampleId, outcome: Outcome) -> LeadResult<OutcomeChange>;

    fn get(&self, id: SampleId) -> Option<Sample> {
        self.table().get(id).cloned()
    }

    /// All samples with a terminal outcome, in insertion order
    fn all_labeled(&self) -> Vec<Sample> {
        self.table()
            .iter()
            .filter(|s| s.outcome.is_terminal())
            .cloned()
            .collect()
    }

    /// All samples, labeled or not, in insertion order
    fn all(&self) -> Vec<Sample> {
        self.table().iter().cloned().collect()
    }

    fn samples(&self, window: &TimeWindow) -> Vec<Sample> {
        self.table()
            .iter()
            .filter(|s| window.contains(&s.created_at))
            .cloned()
            .collect()
    }

    fn count(&self, window: &TimeWindow) -> usize {
        self.table()
            .iter()
            .filter(|s| window.contains(&s.created_at))
            .count()
    }

    fn count_by_outcome(&self, outcome: Outcome, window: &TimeWindow) -> usize {
        self.table()
            .iter()
            .filter(|s| s.outcome == outcome && window.contains(&s.created_at))
            .count()
    }
}
