//! Batch gradient descent for L2-regularized logistic regression
//!
//! Minimizes the mean log-loss plus `||w||^2 / (2 * C * n)`, which matches the
//! usual "C" parameterization of regularization strength. Features are
//! standardized before fitting; the intercept is not penalized.

use thiserror::Error;

use super::{sigmoid, LogisticModel, FEATURE_COUNT};

/// Fitting routine failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("No training rows")]
    Empty,

    #[error("Features and targets differ in length: {features} vs {targets}")]
    LengthMismatch { features: usize, targets: usize },

    #[error("Training targets contain a single class")]
    SingleClass,

    #[error("Training input contains non-finite values")]
    NonFinite,

    #[error("Fit diverged to non-finite parameters")]
    Diverged,
}

/// Optimizer settings
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub max_iterations: usize,
    pub learning_rate: f64,
    /// Inverse regularization strength; larger means weaker penalty
    pub regularization: f64,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            learning_rate: 0.5,
            regularization: 1.0,
            tolerance: 1e-6,
        }
    }
}

/// Fits a logistic regression on `features` with 0/1 `targets`.
pub fn fit(
    features: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    config: &FitConfig,
) -> Result<LogisticModel, FitError> {
    if features.is_empty() {
        return Err(FitError::Empty);
    }
    if features.len() != targets.len() {
        return Err(FitError::LengthMismatch {
            features: features.len(),
            targets: targets.len(),
        });
    }
    if features.iter().flatten().any(|v| !v.is_finite()) || targets.iter().any(|t| !t.is_finite()) {
        return Err(FitError::NonFinite);
    }
    let positives = targets.iter().filter(|t| **t >= 0.5).count();
    if positives == 0 || positives == targets.len() {
        return Err(FitError::SingleClass);
    }

    let n = features.len() as f64;
    let (means, scales) = standardization(features);
    let standardized: Vec<[f64; FEATURE_COUNT]> = features
        .iter()
        .map(|row| {
            let mut z = [0.0; FEATURE_COUNT];
            for i in 0..FEATURE_COUNT {
                z[i] = (row[i] - means[i]) / scales[i];
            }
            z
        })
        .collect();

    let penalty = 1.0 / (config.regularization.max(f64::EPSILON) * n);
    let mut weights = [0.0; FEATURE_COUNT];
    let mut intercept = 0.0;

    for _ in 0..config.max_iterations {
        let mut grad_w = [0.0; FEATURE_COUNT];
        let mut grad_b = 0.0;

        for (row, target) in standardized.iter().zip(targets) {
            let mut z = intercept;
            for i in 0..FEATURE_COUNT {
                z += weights[i] * row[i];
            }
            let residual = sigmoid(z) - target;
            for i in 0..FEATURE_COUNT {
                grad_w[i] += residual * row[i];
            }
            grad_b += residual;
        }

        let mut max_grad = (grad_b / n).abs();
        for i in 0..FEATURE_COUNT {
            grad_w[i] = grad_w[i] / n + penalty * weights[i];
            max_grad = max_grad.max(grad_w[i].abs());
        }

        for i in 0..FEATURE_COUNT {
            weights[i] -= config.learning_rate * grad_w[i];
        }
        intercept -= config.learning_rate * grad_b / n;

        if max_grad < config.tolerance {
            break;
        }
    }

    let model = LogisticModel {
        means,
        scales,
        weights,
        intercept,
    };
    if !model.is_finite() {
        return Err(FitError::Diverged);
    }
    Ok(model)
}

/// Population mean and standard deviation per feature. Constant features
/// get a scale of 1 so they contribute nothing instead of dividing by zero.
fn standardization(features: &[[f64; FEATURE_COUNT]]) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let n = features.len() as f64;
    let mut means = [0.0; FEATURE_COUNT];
    for row in features {
        for i in 0..FEATURE_COUNT {
            means[i] += row[i];
        }
    }
    for mean in means.iter_mut() {
        *mean /= n;
    }

    let mut scales = [0.0; FEATURE_COUNT];
    for row in features {
        for i in 0..FEATURE_COUNT {
            scales[i] += (row[i] - means[i]).powi(2);
        }
    }
    for scale in scales.iter_mut() {
        let std = (*scale / n).sqrt();
        *scale = if std > 1e-12 { std } else { 1.0 };
    }

    (means, scales)
}
