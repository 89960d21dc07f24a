//! Model artifacts
//!
//! A trained classifier bound to a tenant and a version, plus the metrics
//! recorded when it was fitted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::LogisticModel;
use crate::storage::Signals;

/// Monotonically increasing per-tenant model version, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(pub u64);

impl ModelVersion {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        ModelVersion(self.0 + 1)
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which rows the recorded metrics were computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSet {
    /// Stratified held-out partition
    Holdout,
    /// Too few rows to split; metrics are on the training rows
    TrainingSet,
}

/// Metrics captured at training time. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Labeled rows available to the training pass
    pub sample_count: usize,
    pub train_count: usize,
    pub eval_count: usize,
    pub positive_count: usize,
    pub evaluation: EvaluationSet,
    pub accuracy: Option<f64>,
    pub auc: Option<f64>,
}

/// A fitted model that has not been versioned yet
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub classifier: LogisticModel,
    pub metrics: TrainingMetrics,
}

/// A persisted, versioned model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub tenant_id: String,
    pub version: ModelVersion,
    pub trained_at: DateTime<Utc>,
    pub classifier: LogisticModel,
    pub metrics: TrainingMetrics,
}

impl ModelArtifact {
    pub fn new(tenant_id: impl Into<String>, version: ModelVersion, model: TrainedModel) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            version,
            trained_at: Utc::now(),
            classifier: model.classifier,
            metrics: model.metrics,
        }
    }
}

/// Conversion probability for `signals` under `model`, in [0, 1].
///
/// Pure: reads only the artifact's parameters and the three signals.
pub fn predict_proba(model: &ModelArtifact, signals: &Signals) -> f64 {
    let p = model.classifier.predict_proba(&signals.features());
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
