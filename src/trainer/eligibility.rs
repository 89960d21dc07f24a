//! Training eligibility
//!
//! Derived fresh from the labeled population every time; never stored.
//! Checked before the fitting routine is invoked.

use std::fmt;

use crate::classifier::FEATURE_COUNT;
use crate::storage::{Outcome, Sample};

/// Whether a labeled population can be fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Fewer labeled rows than the configured minimum
    InsufficientData { labeled: usize, required: usize },
    /// Every labeled row has the same outcome
    SingleClass { labeled: usize },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "eligible",
            Eligibility::InsufficientData { .. } => "insufficient_data",
            Eligibility::SingleClass { .. } => "single_class",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => write!(f, "eligible"),
            Eligibility::InsufficientData { labeled, required } => {
                write!(f, "{} labeled samples, {} required", labeled, required)
            }
            Eligibility::SingleClass { labeled } => {
                write!(f, "all {} labeled samples share one outcome", labeled)
            }
        }
    }
}

/// Feature rows and 0/1 targets handed to the fitter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<[f64; FEATURE_COUNT]>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    /// Builds rows from samples in insertion order.
    ///
    /// Unknown outcomes are dropped, or read as not converted when
    /// `auto_label_unconfirmed` is set. The samples themselves are untouched.
    pub fn from_samples(samples: &[Sample], auto_label_unconfirmed: bool) -> Self {
        let mut set = TrainingSet::default();
        for sample in samples {
            let target = match sample.outcome {
                Outcome::Unknown if auto_label_unconfirmed => Outcome::NotConverted.target(),
                outcome => outcome.target(),
            };
            if let Some(target) = target {
                set.features.push(sample.signals.features());
                set.targets.push(target);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.targets.iter().filter(|t| **t >= 0.5).count()
    }

    /// Rows at `indices`, in the given order
    pub fn subset(&self, indices: &[usize]) -> TrainingSet {
        TrainingSet {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    pub fn eligibility(&self, min_labeled_samples: usize) -> Eligibility {
        let labeled = self.len();
        if labeled < min_labeled_samples {
            return Eligibility::InsufficientData {
                labeled,
                required: min_labeled_samples,
            };
        }
        let positives = self.positive_count();
        if positives == 0 || positives == labeled {
            return Eligibility::SingleClass { labeled };
        }
        Eligibility::Eligible
    }
}
