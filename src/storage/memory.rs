//! In-memory event store

use chrono::Utc;

use super::errors::StorageResult;
use super::sample::{Outcome, OutcomeChange, Sample, SampleId, Signals};
use super::store::EventStore;
use super::table::SampleTable;
use crate::errors::LeadResult;

/// Event store that keeps samples only for the life of the process
#[derive(Debug)]
pub struct InMemoryEventStore {
    table: SampleTable,
}

impl InMemoryEventStore {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            table: SampleTable::new(tenant_id),
        }
    }
}

impl EventStore for InMemoryEventStore {
    fn table(&self) -> &SampleTable {
        &self.table
    }

    fn append(&mut self, signals: Signals) -> StorageResult<Sample> {
        let sample = self.table.next_sample(signals, Utc::now());
        self.table.insert(sample.clone());
        Ok(sample)
    }

    fn set_outcome(&mut self, id: SampleId, outcome: Outcome) -> LeadResult<OutcomeChange> {
        let change = self.table.plan_outcome(id, outcome)?;
        if change.is_mutation() {
            self.table.apply_outcome(id, outcome, Utc::now());
        }
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LeadError;
    use crate::storage::TimeWindow;

    fn store_with(n: usize) -> InMemoryEventStore {
        let mut store = InMemoryEventStore::new("acme");
        for i in 0..n {
            store
                .append(Signals::new(i as f64, i as u32, i % 2 == 0).unwrap())
                .unwrap();
        }
        store
    }

    #[test]
    fn test_all_labeled_excludes_unknown() {
        let mut store = store_with(3);
        store.set_outcome(SampleId(2), Outcome::Converted).unwrap();

        let labeled = store.all_labeled();
        assert_eq!(labeled.len(), 1);
        assert_eq!(labeled[0].id, SampleId(2));
    }

    #[test]
    fn test_set_outcome_idempotent() {
        let mut store = store_with(1);
        store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
        let before = store.get(SampleId(1)).unwrap();

        let change = store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
        assert_eq!(change, OutcomeChange::Unchanged);
        assert_eq!(store.get(SampleId(1)).unwrap(), before);
    }

    #[test]
    fn test_set_outcome_overwrites_different_terminal() {
        let mut store = store_with(1);
        store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
        store.set_outcome(SampleId(1), Outcome::Converted).unwrap();
        assert_eq!(store.get(SampleId(1)).unwrap().outcome, Outcome::Converted);
    }

    #[test]
    fn test_set_outcome_unknown_id() {
        let mut store = store_with(1);
        let err = store.set_outcome(SampleId(5), Outcome::Converted).unwrap_err();
        assert!(matches!(err, LeadError::LeadNotFound { .. }));
    }

    #[test]
    fn test_counts() {
        let mut store = store_with(4);
        store.set_outcome(SampleId(1), Outcome::Converted).unwrap();
        store.set_outcome(SampleId(2), Outcome::NotConverted).unwrap();

        let all = TimeWindow::default();
        assert_eq!(store.count(&all), 4);
        assert_eq!(store.count_by_outcome(Outcome::Converted, &all), 1);
        assert_eq!(store.count_by_outcome(Outcome::Unknown, &all), 2);
    }
}
