//! Service configuration
//!
//! Loaded from a JSON file. Every field is optional and falls back to a
//! documented default; `validate()` rejects impossible combinations before
//! anything is opened.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::notify::NotifierConfig;
use crate::observability::LoggingConfig;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root directory for per-tenant storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub training: TrainingPolicy,

    #[serde(default)]
    pub scoring: ScoringPolicy,

    #[serde(default)]
    pub feedback: FeedbackPolicy,

    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Absent means hot-lead notifications are only logged
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./leadscore-data")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageConfig::default(),
            training: TrainingPolicy::default(),
            scoring: ScoringPolicy::default(),
            feedback: FeedbackPolicy::default(),
            retention: RetentionPolicy::default(),
            notifier: None,
            http: HttpServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where tenant state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Longest wait for a per-tenant lock before failing with a storage error
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// When and how a tenant's classifier is fitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPolicy {
    /// Fewer labeled samples than this means "insufficient data"
    #[serde(default = "default_min_labeled_samples")]
    pub min_labeled_samples: usize,

    /// Fraction of each class held out for evaluation
    #[serde(default = "default_eval_fraction")]
    pub eval_fraction: f64,

    /// Below this many labeled samples no hold-out split is made
    #[serde(default = "default_min_split_samples")]
    pub min_split_samples: usize,

    /// Present unconfirmed samples to the fitter as not converted.
    /// The event store itself is never relabeled.
    #[serde(default)]
    pub auto_label_unconfirmed: bool,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Inverse L2 strength
    #[serde(default = "default_regularization")]
    pub regularization: f64,

    /// Seed for the stratified split shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_min_labeled_samples() -> usize {
    4
}
fn default_eval_fraction() -> f64 {
    0.3
}
fn default_min_split_samples() -> usize {
    10
}
fn default_max_iterations() -> usize {
    500
}
fn default_learning_rate() -> f64 {
    0.5
}
fn default_regularization() -> f64 {
    1.0
}
fn default_seed() -> u64 {
    42
}

impl Default for TrainingPolicy {
    fn default() -> Self {
        Self {
            min_labeled_samples: default_min_labeled_samples(),
            eval_fraction: default_eval_fraction(),
            min_split_samples: default_min_split_samples(),
            auto_label_unconfirmed: false,
            max_iterations: default_max_iterations(),
            learning_rate: default_learning_rate(),
            regularization: default_regularization(),
            seed: default_seed(),
        }
    }
}

/// How probabilities become decisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Returned when no model exists and none can be trained
    #[serde(default = "default_probability")]
    pub default_probability: f64,

    /// Ceiling applied to model output
    #[serde(default = "default_max_probability")]
    pub max_probability: f64,

    /// Probability at or above which a lead is hot
    #[serde(default = "default_hot_threshold")]
    pub hot_threshold: f64,

    /// Per-tenant overrides of `hot_threshold`
    #[serde(default)]
    pub tenant_thresholds: HashMap<String, f64>,
}

fn default_probability() -> f64 {
    0.35
}
fn default_max_probability() -> f64 {
    0.95
}
fn default_hot_threshold() -> f64 {
    0.7
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            default_probability: default_probability(),
            max_probability: default_max_probability(),
            hot_threshold: default_hot_threshold(),
            tenant_thresholds: HashMap::new(),
        }
    }
}

impl ScoringPolicy {
    /// The hot threshold in force for `tenant_id`
    pub fn threshold_for(&self, tenant_id: &str) -> f64 {
        self.tenant_thresholds
            .get(tenant_id)
            .copied()
            .unwrap_or(self.hot_threshold)
    }
}

/// Retrain trigger selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Retrain synchronously on every confirmation
    Immediate,
    /// Retrain in the background every `batch_threshold` confirmations
    Batched,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackPolicy {
    #[serde(default = "default_trigger")]
    pub policy: TriggerPolicy,

    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: u64,
}

fn default_trigger() -> TriggerPolicy {
    TriggerPolicy::Immediate
}
fn default_batch_threshold() -> u64 {
    5
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            policy: default_trigger(),
            batch_threshold: default_batch_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Model versions kept per tenant
    #[serde(default = "default_max_versions")]
    pub max_versions: usize,
}

fn default_max_versions() -> usize {
    5
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_versions: default_max_versions(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ServiceConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory configuration with defaults, for tests and embedding
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Rejects values no deployment can run with
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.storage.lock_timeout_ms == 0 {
            return invalid("storage.lock_timeout_ms must be > 0".to_string());
        }

        let t = &self.training;
        if t.min_labeled_samples < 2 {
            return invalid("training.min_labeled_samples must be >= 2".to_string());
        }
        if !(t.eval_fraction > 0.0 && t.eval_fraction < 1.0) {
            return invalid(format!(
                "training.eval_fraction must be in (0, 1), got {}",
                t.eval_fraction
            ));
        }
        if t.max_iterations == 0 {
            return invalid("training.max_iterations must be > 0".to_string());
        }
        if !(t.learning_rate > 0.0 && t.learning_rate.is_finite()) {
            return invalid("training.learning_rate must be a positive number".to_string());
        }
        if !(t.regularization > 0.0 && t.regularization.is_finite()) {
            return invalid("training.regularization must be a positive number".to_string());
        }

        let s = &self.scoring;
        for (name, value) in [
            ("scoring.default_probability", s.default_probability),
            ("scoring.max_probability", s.max_probability),
            ("scoring.hot_threshold", s.hot_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be in [0, 1], got {}", name, value));
            }
        }
        if s.default_probability > s.max_probability {
            return invalid(
                "scoring.default_probability must not exceed scoring.max_probability".to_string(),
            );
        }
        for (tenant, threshold) in &s.tenant_thresholds {
            if !(0.0..=1.0).contains(threshold) {
                return invalid(format!(
                    "scoring.tenant_thresholds[{}] must be in [0, 1], got {}",
                    tenant, threshold
                ));
            }
        }

        if self.feedback.batch_threshold == 0 {
            return invalid("feedback.batch_threshold must be >= 1".to_string());
        }
        if self.retention.max_versions == 0 {
            return invalid("retention.max_versions must be >= 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ServiceConfig::from_json("{}").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./leadscore-data"));
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.training.min_labeled_samples, 4);
        assert_eq!(config.scoring.default_probability, 0.35);
        assert_eq!(config.scoring.max_probability, 0.95);
        assert_eq!(config.scoring.hot_threshold, 0.7);
        assert_eq!(config.feedback.policy, TriggerPolicy::Immediate);
        assert_eq!(config.feedback.batch_threshold, 5);
        assert_eq!(config.retention.max_versions, 5);
        assert!(config.notifier.is_none());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = ServiceConfig::from_json(
            r#"{"feedback": {"policy": "batched"}, "scoring": {"tenant_thresholds": {"acme": 0.6}}}"#,
        )
        .unwrap();
        assert_eq!(config.feedback.policy, TriggerPolicy::Batched);
        assert_eq!(config.feedback.batch_threshold, 5);
        assert_eq!(config.scoring.threshold_for("acme"), 0.6);
        assert_eq!(config.scoring.threshold_for("globex"), 0.7);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        for json in [
            r#"{"training": {"min_labeled_samples": 1}}"#,
            r#"{"training": {"eval_fraction": 1.0}}"#,
            r#"{"scoring": {"hot_threshold": 1.5}}"#,
            r#"{"scoring": {"default_probability": 0.9, "max_probability": 0.8}}"#,
            r#"{"feedback": {"batch_threshold": 0}}"#,
            r#"{"retention": {"max_versions": 0}}"#,
            r#"{"storage": {"lock_timeout_ms": 0}}"#,
        ] {
            assert!(
                matches!(ServiceConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ServiceConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_in_memory_config_is_valid() {
        let config = ServiceConfig::in_memory();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }
}
