//! In-memory sample table shared by every event store backend
//!
//! Backends persist first and apply to the table second, so a failed write
//! never leaves the table ahead of durable state.

use chrono::{DateTime, Utc};

use super::sample::{Outcome, OutcomeChange, Sample, SampleId, Signals, TimeWindow};
use crate::errors::{LeadError, LeadResult};

/// Ordered samples of one tenant
#[derive(Debug, Clone)]
pub struct SampleTable {
    tenant_id: String,
    samples: Vec<Sample>,
}

impl SampleTable {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            samples: Vec::new(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Builds the next sample without inserting it.
    ///
    /// `created_at` never goes backwards relative to the last insertion.
    pub fn next_sample(&self, signals: Signals, now: DateTime<Utc>) -> Sample {
        let (id, created_at) = match self.samples.last() {
            Some(last) => (SampleId(last.id.0 + 1), now.max(last.created_at)),
            None => (SampleId(1), now),
        };
        Sample {
            id,
            tenant_id: self.tenant_id.clone(),
            signals,
            outcome: Outcome::Unknown,
            created_at,
            labeled_at: None,
        }
    }

    /// Inserts a sample produced by `next_sample` or replayed from a log.
    pub fn insert(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn get(&self, id: SampleId) -> Option<&Sample> {
        self.position(id).map(|idx| &self.samples[idx])
    }

    fn position(&self, id: SampleId) -> Option<usize> {
        self.samples.binary_search_by_key(&id, |s| s.id).ok()
    }

    /// Decides what `set_outcome` would do, without mutating.
    pub fn plan_outcome(&self, id: SampleId, outcome: Outcome) -> LeadResult<OutcomeChange> {
        if !outcome.is_terminal() {
            return Err(LeadError::validation(
                "outcome must be 'converted' or 'not_converted'",
            ));
        }
        let sample = self.get(id).ok_or_else(|| LeadError::LeadNotFound {
            tenant_id: self.tenant_id.clone(),
            lead_id: id.0,
        })?;
        Ok(match sample.outcome {
            current if current == outcome => OutcomeChange::Unchanged,
            Outcome::Unknown => OutcomeChange::Labeled,
            previous => OutcomeChange::Relabeled { previous },
        })
    }

    /// Applies a terminal outcome. Unknown ids are ignored.
    pub fn apply_outcome(&mut self, id: SampleId, outcome: Outcome, at: DateTime<Utc>) {
        if let Some(idx) = self.position(id) {
            let sample = &mut self.samples[idx];
            sample.outcome = outcome;
            sample.labeled_at = Some(at);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signals() -> Signals {
        Signals::new(10.0, 2, false).unwrap()
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut table = SampleTable::new("acme");
        let now = Utc::now();
        let first = table.next_sample(signals(), now);
        table.insert(first.clone());
        let second = table.next_sample(signals(), now);
        assert_eq!(first.id, SampleId(1));
        assert_eq!(second.id, SampleId(2));
    }

    #[test]
    fn test_created_at_never_goes_backwards() {
        let mut table = SampleTable::new("acme");
        let now = Utc::now();
        table.insert(table.next_sample(signals(), now));
        let earlier = table.next_sample(signals(), now - Duration::seconds(30));
        assert_eq!(earlier.created_at, now);
    }

    #[test]
    fn test_plan_outcome_transitions() {
        let mut table = SampleTable::new("acme");
        let now = Utc::now();
        table.insert(table.next_sample(signals(), now));
        let id = SampleId(1);

        assert_eq!(table.plan_outcome(id, Outcome::Converted).unwrap(), OutcomeChange::Labeled);
        table.apply_outcome(id, Outcome::Converted, now);
        assert_eq!(table.plan_outcome(id, Outcome::Converted).unwrap(), OutcomeChange::Unchanged);
        assert_eq!(
            table.plan_outcome(id, Outcome::NotConverted).unwrap(),
            OutcomeChange::Relabeled {
                previous: Outcome::Converted
            }
        );
    }

    #[test]
    fn test_plan_outcome_rejects_unknown_and_missing() {
        let mut table = SampleTable::new("acme");
        table.insert(table.next_sample(signals(), Utc::now()));

        assert!(matches!(
            table.plan_outcome(SampleId(1), Outcome::Unknown),
            Err(LeadError::Validation(_))
        ));
        assert!(matches!(
            table.plan_outcome(SampleId(7), Outcome::Converted),
            Err(LeadError::LeadNotFound { lead_id: 7, .. })
        ));
    }
}
