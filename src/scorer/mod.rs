//! Scorer subsystem
//!
//! Scoring always records the sample first. The probability then comes from
//! the tenant's current model, a model trained on the spot when none exists,
//! or the configured default prior. Model output is capped at the configured
//! ceiling; the hot decision is a pure threshold on the capped value.

mod signals;

pub use signals::RawSignals;

use std::sync::Arc;

use tracing::info;

use crate::config::ScoringPolicy;
use crate::errors::LeadResult;
use crate::model_store::{predict_proba, ModelArtifact, ModelVersion};
use crate::notify::{Notification, NotificationDispatcher};
use crate::observability::{Event, MetricsRegistry};
use crate::storage::{SampleId, Signals};
use crate::tenant::TenantState;
use crate::trainer::Trainer;

/// Result of scoring one lead
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub lead_id: SampleId,
    pub probability: f64,
    pub is_hot: bool,
    /// Version that produced the probability; `None` means the default prior
    pub model_version: Option<ModelVersion>,
    pub notification_link: Option<String>,
}

pub struct Scorer {
    policy: ScoringPolicy,
    trainer: Arc<Trainer>,
    notifications: Arc<NotificationDispatcher>,
    metrics: Arc<MetricsRegistry>,
}

impl Scorer {
    pub fn new(
        policy: ScoringPolicy,
        trainer: Arc<Trainer>,
        notifications: Arc<NotificationDispatcher>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            policy,
            trainer,
            notifications,
            metrics,
        }
    }

    /// Records `signals` as a new unlabeled lead and scores it.
    ///
    /// Only a failed append is an error; a missing or unusable model falls
    /// back rather than failing the request.
    pub fn score(&self, tenant: &TenantState, signals: Signals) -> LeadResult<ScoreOutcome> {
        let sample = tenant.events()?.append(signals)?;

        let current = tenant.models()?.load_current();
        let model = match current {
            Some(model) => Some(model),
            None => {
                info!(
                    event = %Event::EagerBootstrap,
                    tenant_id = %tenant.id(),
                    lead_id = sample.id.value()
                );
                self.trainer.train_or_skip(tenant)
            }
        };

        let (probability, model_version) = self.probability(model.as_ref(), &signals);
        if model_version.is_none() {
            self.metrics.increment_default_prior_used();
            info!(
                event = %Event::DefaultPriorUsed,
                tenant_id = %tenant.id(),
                lead_id = sample.id.value(),
                probability
            );
        }

        let is_hot = self.is_hot(tenant.id(), probability);
        self.metrics.increment_leads_scored();
        info!(
            event = %Event::LeadScored,
            tenant_id = %tenant.id(),
            lead_id = sample.id.value(),
            probability,
            is_hot,
            model_version = model_version.map(|v| v.value())
        );

        let mut notification_link = None;
        if is_hot {
            self.metrics.increment_hot_leads();
            notification_link = self.notifications.lead_link(tenant.id(), sample.id.value());
            self.notifications.dispatch(Notification {
                tenant_id: tenant.id().to_string(),
                lead_id: sample.id.value(),
                probability,
                link: notification_link.clone(),
            });
        }

        Ok(ScoreOutcome {
            lead_id: sample.id,
            probability,
            is_hot,
            model_version,
            notification_link,
        })
    }

    /// Capped model probability, or the default prior without a model
    pub fn probability(
        &self,
        model: Option<&ModelArtifact>,
        signals: &Signals,
    ) -> (f64, Option<ModelVersion>) {
        match model {
            Some(model) => (
                clamp_probability(predict_proba(model, signals), self.policy.max_probability),
                Some(model.version),
            ),
            None => (
                clamp_probability(self.policy.default_probability, self.policy.max_probability),
                None,
            ),
        }
    }

    pub fn is_hot(&self, tenant_id: &str, probability: f64) -> bool {
        probability >= self.policy.threshold_for(tenant_id)
    }
}

/// Clamps into `[0, ceiling]`; non-finite input reads as 0
pub fn clamp_probability(probability: f64, ceiling: f64) -> f64 {
    if probability.is_finite() {
        probability.clamp(0.0, ceiling.clamp(0.0, 1.0))
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LogisticModel;
    use crate::config::TrainingPolicy;
    use crate::model_store::{EvaluationSet, TrainedModel, TrainingMetrics};
    use crate::notify::RecordingNotifier;
    use crate::tasks::InlineRunner;
    use crate::tenant::TenantId;
    use std::time::Duration;

    struct Fixture {
        scorer: Scorer,
        tenant: TenantState,
        recorder: Arc<RecordingNotifier>,
        metrics: Arc<MetricsRegistry>,
    }

    fn fixture(policy: ScoringPolicy) -> Fixture {
        let metrics = Arc::new(MetricsRegistry::new());
        let recorder = Arc::new(RecordingNotifier::new());
        let notifications = Arc::new(NotificationDispatcher::new(
            recorder.clone(),
            Arc::new(InlineRunner),
            None,
            Arc::clone(&metrics),
        ));
        let trainer = Arc::new(Trainer::new(TrainingPolicy::default(), Arc::clone(&metrics)));
        Fixture {
            scorer: Scorer::new(policy, trainer, notifications, Arc::clone(&metrics)),
            tenant: TenantState::in_memory(
                TenantId::parse("acme").unwrap(),
                3,
                Duration::from_millis(100),
            ),
            recorder,
            metrics,
        }
    }

    /// Model whose output is sigmoid(intercept) regardless of input
    fn constant_model(intercept: f64) -> TrainedModel {
        TrainedModel {
            classifier: LogisticModel {
                means: [0.0; 3],
                scales: [1.0; 3],
                weights: [0.0; 3],
                intercept,
            },
            metrics: TrainingMetrics {
                sample_count: 4,
                train_count: 4,
                eval_count: 4,
                positive_count: 2,
                evaluation: EvaluationSet::TrainingSet,
                accuracy: None,
                auc: None,
            },
        }
    }

    fn signals() -> Signals {
        Signals::new(10.0, 2, true).unwrap()
    }

    #[test]
    fn test_default_prior_without_model() {
        let f = fixture(ScoringPolicy::default());
        let outcome = f.scorer.score(&f.tenant, signals()).unwrap();

        assert_eq!(outcome.lead_id, SampleId(1));
        assert_eq!(outcome.probability, 0.35);
        assert!(!outcome.is_hot);
        assert!(outcome.model_version.is_none());
        assert_eq!(f.metrics.snapshot().fits_attempted, 0);
        assert_eq!(f.metrics.snapshot().default_prior_used, 1);
    }

    #[test]
    fn test_model_output_is_capped() {
        let f = fixture(ScoringPolicy::default());
        f.tenant.models().unwrap().save(constant_model(10.0)).unwrap();

        let outcome = f.scorer.score(&f.tenant, signals()).unwrap();
        assert_eq!(outcome.probability, 0.95);
        assert!(outcome.is_hot);
        assert_eq!(outcome.model_version, Some(ModelVersion(1)));
    }

    #[test]
    fn test_hot_lead_notifies_once() {
        let f = fixture(ScoringPolicy::default());
        f.tenant.models().unwrap().save(constant_model(10.0)).unwrap();

        f.scorer.score(&f.tenant, signals()).unwrap();
        assert_eq!(f.recorder.sent_count(), 1);
        assert_eq!(f.recorder.sent()[0].1.lead_id, 1);
        assert_eq!(f.metrics.snapshot().hot_leads, 1);
    }

    #[test]
    fn test_cold_lead_does_not_notify() {
        let f = fixture(ScoringPolicy::default());
        f.tenant.models().unwrap().save(constant_model(-10.0)).unwrap();

        let outcome = f.scorer.score(&f.tenant, signals()).unwrap();
        assert!(!outcome.is_hot);
        assert_eq!(f.recorder.sent_count(), 0);
    }

    #[test]
    fn test_tenant_threshold_override() {
        let mut policy = ScoringPolicy::default();
        policy.tenant_thresholds.insert("acme".to_string(), 0.3);
        let f = fixture(policy);

        let outcome = f.scorer.score(&f.tenant, signals()).unwrap();
        assert_eq!(outcome.probability, 0.35);
        assert!(outcome.is_hot);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let f = fixture(ScoringPolicy::default());
        assert!(f.scorer.is_hot("acme", 0.7));
        assert!(!f.scorer.is_hot("acme", 0.6999));
    }

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(1.2, 0.95), 0.95);
        assert_eq!(clamp_probability(-0.1, 0.95), 0.0);
        assert_eq!(clamp_probability(f64::NAN, 0.95), 0.0);
        assert_eq!(clamp_probability(0.5, 0.95), 0.5);
    }
}
