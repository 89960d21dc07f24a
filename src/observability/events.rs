//! Observable events
//!
//! Every log line carries one of these in its `event` field so log
//! consumers can filter without parsing messages.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// HTTP server ready for requests
    Serving,
    /// Tenant state opened from storage
    TenantOpened,
    /// A failed append could not be rolled back; the event log refuses writes
    EventLogPoisoned,

    // Scoring
    /// A sample was scored
    LeadScored,
    /// No model available; default prior returned
    DefaultPriorUsed,
    /// Scoring with no current model triggered a training attempt
    EagerBootstrap,

    // Feedback
    /// An outcome was confirmed for a lead
    OutcomeConfirmed,
    /// A retrain was queued by the batched policy
    RetrainScheduled,
    /// Training declined: not enough labeled data or one class only
    RetrainSkipped,
    /// Training failed on storage or fitting
    RetrainFailed,

    // Models
    /// A model was fitted and saved
    ModelTrained,
    /// A stored artifact could not be loaded
    ModelLoadFailed,
    /// A pruned artifact could not be deleted
    ModelPruneFailed,

    // Notifications
    NotificationSent,
    NotificationFailed,

    // Bulk import
    ImportComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "SERVING",
            Event::TenantOpened => "TENANT_OPENED",
            Event::EventLogPoisoned => "EVENT_LOG_POISONED",
            Event::LeadScored => "LEAD_SCORED",
            Event::DefaultPriorUsed => "DEFAULT_PRIOR_USED",
            Event::EagerBootstrap => "EAGER_BOOTSTRAP",
            Event::OutcomeConfirmed => "OUTCOME_CONFIRMED",
            Event::RetrainScheduled => "RETRAIN_SCHEDULED",
            Event::RetrainSkipped => "RETRAIN_SKIPPED",
            Event::RetrainFailed => "RETRAIN_FAILED",
            Event::ModelTrained => "MODEL_TRAINED",
            Event::ModelLoadFailed => "MODEL_LOAD_FAILED",
            Event::ModelPruneFailed => "MODEL_PRUNE_FAILED",
            Event::NotificationSent => "NOTIFICATION_SENT",
            Event::NotificationFailed => "NOTIFICATION_FAILED",
            Event::ImportComplete => "IMPORT_COMPLETE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        for event in [
            Event::LeadScored,
            Event::DefaultPriorUsed,
            Event::RetrainSkipped,
            Event::NotificationFailed,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
            assert_eq!(event.to_string(), name);
        }
    }
}
