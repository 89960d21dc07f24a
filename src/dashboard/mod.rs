//! Dashboard aggregation
//!
//! Read-only counts over a tenant's Event Store. No model is consulted:
//! "hot" here means a confirmed conversion, and every other lead counts as
//! cold.

use serde::Serialize;

use crate::storage::{EventStore, Outcome, Sample, TimeWindow};

/// Aggregated view of a tenant's leads
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub hot_count: usize,
    pub cold_count: usize,
    /// Leads still awaiting an outcome
    pub pending: usize,
    /// `hot_count / total`, 0 when there are no leads
    pub conversion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads: Option<Vec<Sample>>,
}

impl DashboardSummary {
    /// Summary for a tenant with no recorded leads
    pub fn empty(include_leads: bool) -> Self {
        Self {
            leads: include_leads.then(Vec::new),
            ..Self::default()
        }
    }
}

/// Computes the summary for the leads created inside `window`
pub fn summarize(
    store: &dyn EventStore,
    window: &TimeWindow,
    include_leads: bool,
) -> DashboardSummary {
    let total = store.count(window);
    let hot_count = store.count_by_outcome(Outcome::Converted, window);
    let pending = store.count_by_outcome(Outcome::Unknown, window);
    let conversion_rate = if total == 0 {
        0.0
    } else {
        hot_count as f64 / total as f64
    };

    DashboardSummary {
        total,
        hot_count,
        cold_count: total - hot_count,
        pending,
        conversion_rate,
        leads: include_leads.then(|| store.samples(window)),
    }
}
