//! Feedback Loop Controller
//!
//! Folds confirmed outcomes back into the Event Store and decides when to
//! retrain. Under the immediate trigger every confirmation retrains before
//! returning; under the batched trigger the tenant's feedback counter is
//! bumped and a background retrain is queued once it reaches the threshold.
//!
//! Two batched confirmations racing past the threshold may both queue a
//! retrain. That is harmless: a retrain reads the full labeled set and
//! always saves a new version.

use std::sync::Arc;

use tracing::info;

use crate::config::{FeedbackPolicy, TriggerPolicy};
use crate::errors::LeadResult;
use crate::model_store::ModelVersion;
use crate::observability::{Event, MetricsRegistry};
use crate::storage::{Outcome, OutcomeChange, SampleId};
use crate::tasks::TaskRunner;
use crate::tenant::TenantState;
use crate::trainer::Trainer;

/// When confirmations lead to a retrain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainTrigger {
    Immediate,
    Batched { threshold: u64 },
}

impl From<&FeedbackPolicy> for RetrainTrigger {
    fn from(policy: &FeedbackPolicy) -> Self {
        match policy.policy {
            TriggerPolicy::Immediate => RetrainTrigger::Immediate,
            TriggerPolicy::Batched => RetrainTrigger::Batched {
                threshold: policy.batch_threshold.max(1),
            },
        }
    }
}

/// What a confirmation did about retraining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainDecision {
    /// Retrained synchronously; `None` when the pass produced no model
    Ran(Option<ModelVersion>),
    /// Background retrain queued
    Scheduled,
    /// Counter below the batch threshold
    Deferred { pending: u64, threshold: u64 },
    /// The outcome was already recorded; nothing changed
    NotNeeded,
}

/// Result of one confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub lead_id: SampleId,
    pub outcome: Outcome,
    pub change: OutcomeChange,
    pub retrain: RetrainDecision,
}

pub struct FeedbackController {
    trigger: RetrainTrigger,
    trainer: Arc<Trainer>,
    runner: Arc<dyn TaskRunner>,
    metrics: Arc<MetricsRegistry>,
}

impl FeedbackController {
    pub fn new(
        trigger: RetrainTrigger,
        trainer: Arc<Trainer>,
        runner: Arc<dyn TaskRunner>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            trigger,
            trainer,
            runner,
            metrics,
        }
    }

    /// Records `outcome` for `lead_id` and applies the retrain trigger.
    ///
    /// Fails only when the lead is unknown, the outcome is not terminal, or
    /// the label cannot be stored. Retrain outcomes are never errors.
    pub fn confirm(
        &self,
        tenant: &Arc<TenantState>,
        lead_id: SampleId,
        outcome: Outcome,
    ) -> LeadResult<Confirmation> {
        let change = tenant.events()?.set_outcome(lead_id, outcome)?;

        self.metrics.increment_outcomes_confirmed();
        info!(
            event = %Event::OutcomeConfirmed,
            tenant_id = %tenant.id(),
            lead_id = lead_id.value(),
            outcome = %outcome,
            change = ?change
        );

        let retrain = if change.is_mutation() {
            self.apply_trigger(tenant)
        } else {
            RetrainDecision::NotNeeded
        };

        Ok(Confirmation {
            lead_id,
            outcome,
            change,
            retrain,
        })
    }

    fn apply_trigger(&self, tenant: &Arc<TenantState>) -> RetrainDecision {
        match self.trigger {
            RetrainTrigger::Immediate => {
                let model = self.trainer.train_or_skip(tenant);
                RetrainDecision::Ran(model.map(|m| m.version))
            }
            RetrainTrigger::Batched { threshold } => {
                let pending = tenant.record_confirmation();
                if pending < threshold {
                    return RetrainDecision::Deferred { pending, threshold };
                }

                info!(
                    event = %Event::RetrainScheduled,
                    tenant_id = %tenant.id(),
                    pending,
                    threshold
                );
                let trainer = Arc::clone(&self.trainer);
                let tenant = Arc::clone(tenant);
                self.runner.spawn(
                    "retrain",
                    Box::new(move || {
                        trainer.train_or_skip(&tenant);
                    }),
                );
                RetrainDecision::Scheduled
            }
        }
    }
}
