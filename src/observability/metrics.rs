//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase, reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-wide operational counters
///
/// Uses Relaxed ordering; counters are independent of one another.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    leads_scored: AtomicU64,
    hot_leads: AtomicU64,
    default_prior_used: AtomicU64,
    outcomes_confirmed: AtomicU64,
    fits_attempted: AtomicU64,
    models_trained: AtomicU64,
    retrains_skipped: AtomicU64,
    retrains_failed: AtomicU64,
    models_pruned: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_leads_scored(&self) {
        self.leads_scored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_hot_leads(&self) {
        self.hot_leads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_default_prior_used(&self) {
        self.default_prior_used.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_outcomes_confirmed(&self) {
        self.outcomes_confirmed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counted every time the fitting routine is actually invoked
    pub fn increment_fits_attempted(&self) {
        self.fits_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_models_trained(&self) {
        self.models_trained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retrains_skipped(&self) {
        self.retrains_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retrains_failed(&self) {
        self.retrains_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_models_pruned(&self, count: u64) {
        self.models_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            leads_scored: self.leads_scored.load(Ordering::Relaxed),
            hot_leads: self.hot_leads.load(Ordering::Relaxed),
            default_prior_used: self.default_prior_used.load(Ordering::Relaxed),
            outcomes_confirmed: self.outcomes_confirmed.load(Ordering::Relaxed),
            fits_attempted: self.fits_attempted.load(Ordering::Relaxed),
            models_trained: self.models_trained.load(Ordering::Relaxed),
            retrains_skipped: self.retrains_skipped.load(Ordering::Relaxed),
            retrains_failed: self.retrains_failed.load(Ordering::Relaxed),
            models_pruned: self.models_pruned.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub leads_scored: u64,
    pub hot_leads: u64,
    pub default_prior_used: u64,
    pub outcomes_confirmed: u64,
    pub fits_attempted: u64,
    pub models_trained: u64,
    pub retrains_skipped: u64,
    pub retrains_failed: u64,
    pub models_pruned: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.leads_scored, 0);
        assert_eq!(snapshot.fits_attempted, 0);
        assert_eq!(snapshot.notifications_failed, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_leads_scored();
        registry.increment_leads_scored();
        registry.increment_hot_leads();
        registry.increment_fits_attempted();
        registry.add_models_pruned(3);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.leads_scored, 2);
        assert_eq!(snapshot.hot_leads, 1);
        assert_eq!(snapshot.fits_attempted, 1);
        assert_eq!(snapshot.models_pruned, 3);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let reg = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.increment_outcomes_confirmed();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().outcomes_confirmed, 1000);
    }
}
