//! Trainer subsystem
//!
//! A training pass reads the tenant's full labeled history, checks
//! eligibility before fitting anything, fits and evaluates a classifier,
//! saves it as a new model version and clears the confirmations it saw from
//! the tenant's feedback counter.
//!
//! "Not enough data" and "one class only" are steady-state outcomes: the
//! pass returns `None` and logs, it never raises.

mod eligibility;

pub use eligibility::{Eligibility, TrainingSet};

use std::sync::Arc;

use tracing::{info, warn};

use crate::classifier::{self, accuracy, roc_auc, stratified_split, FitConfig, FitError};
use crate::config::TrainingPolicy;
use crate::errors::LeadResult;
use crate::model_store::{EvaluationSet, ModelArtifact, TrainedModel, TrainingMetrics};
use crate::observability::{Event, MetricsRegistry, ObservationScope};
use crate::tenant::TenantState;

/// Fits per-tenant classifiers under a fixed policy
pub struct Trainer {
    policy: TrainingPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl Trainer {
    pub fn new(policy: TrainingPolicy, metrics: Arc<MetricsRegistry>) -> Self {
        Self { policy, metrics }
    }

    /// Runs one training pass for `tenant`.
    ///
    /// Returns `Ok(None)` when the tenant is not eligible or the fit does not
    /// converge. Only storage failures are errors.
    pub fn train(&self, tenant: &TenantState) -> LeadResult<Option<ModelArtifact>> {
        let scope = ObservationScope::new("TRAINING", tenant.id());

        let confirmations_seen = tenant.pending_confirmations();
        let samples = {
            let events = tenant.events()?;
            if self.policy.auto_label_unconfirmed {
                events.all()
            } else {
                events.all_labeled()
            }
        };
        let set = TrainingSet::from_samples(&samples, self.policy.auto_label_unconfirmed);

        let eligibility = set.eligibility(self.policy.min_labeled_samples);
        if !eligibility.is_eligible() {
            self.metrics.increment_retrains_skipped();
            info!(
                event = %Event::RetrainSkipped,
                tenant_id = %tenant.id(),
                reason = eligibility.reason(),
                detail = %eligibility
            );
            scope.complete(eligibility.reason());
            return Ok(None);
        }

        self.metrics.increment_fits_attempted();
        let model = match self.fit(&set) {
            Ok(model) => model,
            Err(e) => {
                self.metrics.increment_retrains_failed();
                warn!(
                    event = %Event::RetrainFailed,
                    tenant_id = %tenant.id(),
                    error = %e
                );
                scope.complete("fit_failed");
                return Ok(None);
            }
        };

        let (artifact, pruned) = {
            let mut models = tenant.models()?;
            let before = models.versions().len();
            let artifact = models.save(model)?;
            let pruned = (before + 1).saturating_sub(models.versions().len());
            (artifact, pruned)
        };

        tenant.acknowledge_confirmations(confirmations_seen);
        self.metrics.increment_models_trained();
        self.metrics.add_models_pruned(pruned as u64);
        info!(
            event = %Event::ModelTrained,
            tenant_id = %tenant.id(),
            version = artifact.version.value(),
            samples = artifact.metrics.sample_count,
            evaluation = ?artifact.metrics.evaluation,
            accuracy = ?artifact.metrics.accuracy,
            auc = ?artifact.metrics.auc,
            pruned
        );
        scope.complete("trained");
        Ok(Some(artifact))
    }

    /// Like [`Trainer::train`], but storage failures are logged and read as
    /// "no model". For callers that must not fail on a retrain.
    pub fn train_or_skip(&self, tenant: &TenantState) -> Option<ModelArtifact> {
        match self.train(tenant) {
            Ok(model) => model,
            Err(e) => {
                self.metrics.increment_retrains_failed();
                warn!(
                    event = %Event::RetrainFailed,
                    tenant_id = %tenant.id(),
                    error = %e
                );
                None
            }
        }
    }

    /// Fits an eligible set and computes its evaluation metrics.
    ///
    /// Large enough sets are split stratified by outcome and evaluated on
    /// the held-out rows; smaller ones are evaluated on the training rows.
    pub fn fit(&self, set: &TrainingSet) -> Result<TrainedModel, FitError> {
        let config = FitConfig {
            max_iterations: self.policy.max_iterations,
            learning_rate: self.policy.learning_rate,
            regularization: self.policy.regularization,
            ..FitConfig::default()
        };

        let split = if set.len() >= self.policy.min_split_samples {
            stratified_split(&set.targets, self.policy.eval_fraction, self.policy.seed)
        } else {
            None
        };

        let (train, eval, evaluation) = match split {
            Some(split) => (
                set.subset(&split.train),
                set.subset(&split.eval),
                EvaluationSet::Holdout,
            ),
            None => (set.clone(), set.clone(), EvaluationSet::TrainingSet),
        };

        let classifier = classifier::fit(&train.features, &train.targets, &config)?;
        let probabilities: Vec<f64> = eval
            .features
            .iter()
            .map(|row| classifier.predict_proba(row))
            .collect();

        Ok(TrainedModel {
            metrics: TrainingMetrics {
                sample_count: set.len(),
                train_count: train.len(),
                eval_count: eval.len(),
                positive_count: set.positive_count(),
                evaluation,
                accuracy: accuracy(&probabilities, &eval.targets),
                auc: roc_auc(&probabilities, &eval.targets),
            },
            classifier,
        })
    }
}
