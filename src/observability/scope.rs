//! ObservationScope for begin/complete logging around a unit of work
//!
//! - Logs `{NAME}_BEGIN` on creation
//! - Logs `{NAME}_COMPLETE` with elapsed milliseconds on `complete()`
//! - Logs `{NAME}_ERROR` on drop if never completed

use std::time::Instant;

use tracing::{error, info};

pub struct ObservationScope {
    name: &'static str,
    tenant_id: String,
    started: Instant,
    completed: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str, tenant_id: &str) -> Self {
        info!(event = %format!("{}_BEGIN", name), tenant_id = %tenant_id);
        Self {
            name,
            tenant_id: tenant_id.to_string(),
            started: Instant::now(),
            completed: false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Marks the scope as completed with an outcome label.
    pub fn complete(mut self, outcome: &str) {
        self.completed = true;
        info!(
            event = %format!("{}_COMPLETE", self.name),
            tenant_id = %self.tenant_id,
            outcome = %outcome,
            elapsed_ms = self.elapsed_ms()
        );
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            error!(
                event = %format!("{}_ERROR", self.name),
                tenant_id = %self.tenant_id,
                elapsed_ms = self.elapsed_ms()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_completes_without_panic() {
        let scope = ObservationScope::new("TRAINING", "acme");
        scope.complete("trained");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TRAINING", "acme");
        assert!(scope.elapsed_ms() < 60_000);
        drop(scope);
    }
}
