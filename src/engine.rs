//! Lead engine
//!
//! Wires the tenant registry, trainer, scorer, feedback controller and
//! notifier together behind the operations the HTTP server and CLI call.
//! Nothing here holds per-tenant state of its own.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::ServiceConfig;
use crate::dashboard::{self, DashboardSummary};
use crate::errors::{LeadError, LeadResult};
use crate::feedback::{Confirmation, FeedbackController, RetrainTrigger};
use crate::model_store::{ModelArtifact, ModelVersion};
use crate::notify::{create_notifier, NotificationDispatcher, Notifier};
use crate::observability::{Event, MetricsRegistry};
use crate::scorer::{RawSignals, ScoreOutcome, Scorer};
use crate::storage::{Outcome, SampleId, Signals, TimeWindow};
use crate::tasks::{BackgroundRunner, TaskRunner};
use crate::tenant::TenantRegistry;
use crate::trainer::Trainer;

/// One row of a bulk import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    #[serde(flatten)]
    pub signals: RawSignals,
    /// `converted`/`not_converted`, 1/0, true/false, or absent for unknown
    #[serde(default)]
    pub outcome: Option<Value>,
}

impl ImportRecord {
    fn parse(&self) -> LeadResult<(Signals, Outcome)> {
        let signals = self.signals.parse()?;
        let outcome = match &self.outcome {
            None | Some(Value::Null) => Outcome::Unknown,
            Some(Value::String(s)) => s.parse()?,
            Some(Value::Bool(true)) => Outcome::Converted,
            Some(Value::Bool(false)) => Outcome::NotConverted,
            Some(Value::Number(n)) if n.as_f64() == Some(1.0) => Outcome::Converted,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Outcome::NotConverted,
            Some(other) => {
                return Err(LeadError::validation(format!(
                    "outcome must be converted, not_converted, 1 or 0, got {}",
                    other
                )))
            }
        };
        Ok((signals, outcome))
    }
}

/// Result of a bulk import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub labeled: usize,
    /// Model produced by the retrain that follows the import
    pub model_version: Option<ModelVersion>,
}

pub struct LeadEngine {
    config: ServiceConfig,
    registry: TenantRegistry,
    trainer: Arc<Trainer>,
    scorer: Scorer,
    feedback: FeedbackController,
    metrics: Arc<MetricsRegistry>,
}

impl LeadEngine {
    /// Engine with background task execution and the configured notifier
    pub fn new(config: ServiceConfig) -> Self {
        let notifier = create_notifier(config.notifier.as_ref());
        Self::with_collaborators(
            config,
            Arc::new(BackgroundRunner),
            notifier,
            Arc::new(MetricsRegistry::new()),
        )
    }

    pub fn with_collaborators(
        config: ServiceConfig,
        runner: Arc<dyn TaskRunner>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let registry = TenantRegistry::new(
            config.data_dir.clone(),
            config.storage.clone(),
            config.retention.max_versions,
        );
        let trainer = Arc::new(Trainer::new(config.training.clone(), Arc::clone(&metrics)));
        let notifications = Arc::new(NotificationDispatcher::new(
            notifier,
            Arc::clone(&runner),
            config.notifier.clone(),
            Arc::clone(&metrics),
        ));
        let scorer = Scorer::new(
            config.scoring.clone(),
            Arc::clone(&trainer),
            notifications,
            Arc::clone(&metrics),
        );
        let feedback = FeedbackController::new(
            RetrainTrigger::from(&config.feedback),
            Arc::clone(&trainer),
            runner,
            Arc::clone(&metrics),
        );

        Self {
            config,
            registry,
            trainer,
            scorer,
            feedback,
            metrics,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Where the credential directory lives for the file backend
    pub fn directory_path(&self) -> PathBuf {
        self.config.data_dir.join("tenants.json")
    }

    /// Scores a new lead, creating the tenant on first use
    pub fn score(&self, tenant_id: &str, signals: Signals) -> LeadResult<ScoreOutcome> {
        let tenant = self.registry.get_or_create(tenant_id)?;
        self.scorer.score(&tenant, signals)
    }

    /// Validates raw client input, then scores it
    pub fn score_raw(&self, tenant_id: &str, raw: &RawSignals) -> LeadResult<ScoreOutcome> {
        let signals = raw.parse()?;
        self.score(tenant_id, signals)
    }

    /// Records a confirmed outcome for a known tenant's lead
    pub fn confirm(&self, tenant_id: &str, lead_id: u64, outcome: Outcome) -> LeadResult<Confirmation> {
        let tenant = self.registry.get(tenant_id)?;
        self.feedback.confirm(&tenant, SampleId(lead_id), outcome)
    }

    /// Aggregated counts; an unseen tenant reads as all zeros
    pub fn dashboard(
        &self,
        tenant_id: &str,
        window: &TimeWindow,
        include_leads: bool,
    ) -> LeadResult<DashboardSummary> {
        let tenant = match self.registry.get(tenant_id) {
            Ok(tenant) => tenant,
            Err(LeadError::TenantNotFound(_)) => return Ok(DashboardSummary::empty(include_leads)),
            Err(e) => return Err(e),
        };
        let events = tenant.events()?;
        Ok(dashboard::summarize(&**events, window, include_leads))
    }

    /// One explicit training pass for a known tenant
    pub fn train(&self, tenant_id: &str) -> LeadResult<Option<ModelArtifact>> {
        let tenant = self.registry.get(tenant_id)?;
        self.trainer.train(&tenant)
    }

    /// The tenant's current model, if any
    pub fn current_model(&self, tenant_id: &str) -> LeadResult<Option<ModelArtifact>> {
        let tenant = self.registry.get(tenant_id)?;
        let current = tenant.models()?.load_current();
        Ok(current)
    }

    /// Appends historical leads, with outcomes where known, then retrains.
    ///
    /// Every record is validated before anything is written.
    pub fn import(&self, tenant_id: &str, records: &[ImportRecord]) -> LeadResult<ImportReport> {
        let parsed = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                record.parse().map_err(|e| match e {
                    LeadError::Validation(msg) => {
                        LeadError::validation(format!("record {}: {}", i, msg))
                    }
                    other => other,
                })
            })
            .collect::<LeadResult<Vec<_>>>()?;

        let tenant = self.registry.get_or_create(tenant_id)?;
        let mut labeled = 0;
        {
            let mut events = tenant.events()?;
            for (signals, outcome) in &parsed {
                let sample = events.append(*signals)?;
                if outcome.is_terminal() {
                    events.set_outcome(sample.id, *outcome)?;
                    labeled += 1;
                }
            }
        }

        let model = self.trainer.train_or_skip(&tenant);
        info!(
            event = %Event::ImportComplete,
            tenant_id = %tenant.id(),
            imported = parsed.len(),
            labeled,
            model_version = model.as_ref().map(|m| m.version.value())
        );

        Ok(ImportReport {
            imported: parsed.len(),
            labeled,
            model_version: model.map(|m| m.version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::tasks::InlineRunner;

    fn engine() -> LeadEngine {
        LeadEngine::with_collaborators(
            ServiceConfig::in_memory(),
            Arc::new(InlineRunner),
            Arc::new(RecordingNotifier::new()),
            Arc::new(MetricsRegistry::new()),
        )
    }

    fn records(json: &str) -> Vec<ImportRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_confirm_unknown_tenant() {
        let engine = engine();
        assert!(matches!(
            engine.confirm("acme", 1, Outcome::Converted),
            Err(LeadError::TenantNotFound(_))
        ));
    }

    #[test]
    fn test_dashboard_unknown_tenant_is_zero() {
        let engine = engine();
        let summary = engine.dashboard("acme", &TimeWindow::default(), false).unwrap();
        assert_eq!(summary, DashboardSummary::empty(false));
    }

    #[test]
    fn test_import_labels_and_trains() {
        let engine = engine();
        let report = engine
            .import(
                "acme",
                &records(
                    r#"[
                    {"time_on_site": 5, "pages_visited": 1, "clicked_price": 0, "outcome": 0},
                    {"time_on_site": 8, "pages_visited": 2, "clicked_price": 0, "outcome": "not_converted"},
                    {"time_on_site": 12, "pages_visited": 3, "clicked_price": 1, "outcome": 1},
                    {"time_on_site": 20, "pages_visited": 5, "clicked_price": 1, "outcome": "converted"},
                    {"time_on_site": 9, "pages_visited": 2, "clicked_price": 1}
                ]"#,
                ),
            )
            .unwrap();

        assert_eq!(report.imported, 5);
        assert_eq!(report.labeled, 4);
        assert_eq!(report.model_version, Some(ModelVersion(1)));
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let engine = engine();
        let err = engine
            .import(
                "acme",
                &records(
                    r#"[
                    {"time_on_site": 5, "pages_visited": 1, "clicked_price": 0},
                    {"time_on_site": 8, "pages_visited": 2, "clicked_price": 0, "outcome": "maybe"}
                ]"#,
                ),
            )
            .unwrap_err();

        assert!(matches!(err, LeadError::Validation(ref m) if m.starts_with("record 1")));
        assert!(matches!(
            engine.dashboard("acme", &TimeWindow::default(), false),
            Ok(ref s) if s.total == 0
        ));
    }

    #[test]
    fn test_score_raw_validates_before_append() {
        let engine = engine();
        let raw: RawSignals =
            serde_json::from_str(r#"{"time_on_site": "x", "pages_visited": 1, "clicked_price": 0}"#)
                .unwrap();
        assert!(engine.score_raw("acme", &raw).is_err());
        assert!(engine.registry().loaded_tenants().is_empty());
    }
}
