//! Binary classifier over the three lead signals
//!
//! A standardized logistic regression. Parameters are plain data so a
//! fitted model can be persisted as part of a model artifact and scored
//! without any hidden state.

mod fit;
mod metrics;
mod split;

pub use fit::{fit, FitConfig, FitError};
pub use metrics::{accuracy, roc_auc};
pub use split::{stratified_split, Split};

use serde::{Deserialize, Serialize};

/// Number of input features
pub const FEATURE_COUNT: usize = 3;

/// Fitted logistic regression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Per-feature mean used for standardization
    pub means: [f64; FEATURE_COUNT],
    /// Per-feature scale used for standardization (never zero)
    pub scales: [f64; FEATURE_COUNT],
    pub weights: [f64; FEATURE_COUNT],
    pub intercept: f64,
}

impl LogisticModel {
    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        sigmoid(self.decision(features))
    }

    fn decision(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut z = self.intercept;
        for i in 0..FEATURE_COUNT {
            z += self.weights[i] * (features[i] - self.means[i]) / self.scales[i];
        }
        z
    }

    /// Returns whether every parameter is a finite number.
    pub fn is_finite(&self) -> bool {
        self.intercept.is_finite()
            && self
                .means
                .iter()
                .chain(self.scales.iter())
                .chain(self.weights.iter())
                .all(|v| v.is_finite())
            && self.scales.iter().all(|s| *s > 0.0)
    }
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(3.0) > sigmoid(2.0));
    }

    #[test]
    fn test_predict_uses_standardization() {
        let model = LogisticModel {
            means: [10.0, 0.0, 0.0],
            scales: [5.0, 1.0, 1.0],
            weights: [1.0, 0.0, 0.0],
            intercept: 0.0,
        };
        assert!((model.predict_proba(&[10.0, 7.0, 1.0]) - 0.5).abs() < 1e-12);
        assert!((model.predict_proba(&[15.0, 0.0, 0.0]) - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_model_detected() {
        let model = LogisticModel {
            means: [0.0; 3],
            scales: [1.0, 0.0, 1.0],
            weights: [0.0; 3],
            intercept: 0.0,
        };
        assert!(!model.is_finite());
    }
}
