//! Hot-lead notifications
//!
//! Outbound delivery is fire-and-forget: the dispatcher hands the send to a
//! [`TaskRunner`] and returns immediately. Delivery failures are logged and
//! counted, never returned to the scoring caller.

mod smtp;

pub use smtp::SmtpNotifier;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::observability::{Event, MetricsRegistry};
use crate::tasks::TaskRunner;

/// Notification delivery failures
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notifier configuration. Without `smtp_host`, notifications are logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_user: String,

    /// Should come from secrets
    #[serde(default)]
    pub smtp_password: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Recipient for tenants without their own entry
    #[serde(default)]
    pub default_destination: Option<String>,

    #[serde(default)]
    pub tenant_destinations: HashMap<String, String>,

    /// Base URL for lead links included in notifications and responses
    #[serde(default)]
    pub link_base: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "alerts@leadscore.local".to_string()
}

fn default_from_name() -> String {
    "Leadscore".to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            default_destination: None,
            tenant_destinations: HashMap::new(),
            link_base: None,
        }
    }
}

impl NotifierConfig {
    pub fn destination_for(&self, tenant_id: &str) -> Option<&str> {
        self.tenant_destinations
            .get(tenant_id)
            .or(self.default_destination.as_ref())
            .map(String::as_str)
    }

    pub fn lead_link(&self, tenant_id: &str, lead_id: u64) -> Option<String> {
        self.link_base.as_ref().map(|base| {
            format!("{}/leads/{}/{}", base.trim_end_matches('/'), tenant_id, lead_id)
        })
    }
}

/// One outbound hot-lead message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub tenant_id: String,
    pub lead_id: u64,
    pub probability: f64,
    pub link: Option<String>,
}

impl Notification {
    pub fn subject(&self) -> String {
        format!("Hot lead #{} ({:.0}%)", self.lead_id, self.probability * 100.0)
    }

    pub fn body(&self) -> String {
        let mut body = format!(
            "Lead #{} for {} scored {:.2} and is marked hot.\n",
            self.lead_id, self.tenant_id, self.probability
        );
        if let Some(link) = &self.link {
            body.push_str(&format!("\n{}\n", link));
        }
        body
    }
}

/// Outbound notification channel
pub trait Notifier: Send + Sync {
    fn notify(&self, destination: &str, notification: &Notification) -> NotifyResult<()>;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, destination: &str, notification: &Notification) -> NotifyResult<()> {
        info!(
            event = %Event::NotificationSent,
            tenant_id = %notification.tenant_id,
            lead_id = notification.lead_id,
            destination = %destination,
            subject = %notification.subject(),
            "notification logged"
        );
        Ok(())
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<(String, Notification)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails
    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, destination: &str, notification: &Notification) -> NotifyResult<()> {
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".to_string()));
        }
        self.sent
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((destination.to_string(), notification.clone()));
        Ok(())
    }
}

/// SMTP when configured, log output otherwise
pub fn create_notifier(config: Option<&NotifierConfig>) -> Arc<dyn Notifier> {
    match config {
        Some(cfg) if cfg.smtp_host.is_some() => Arc::new(SmtpNotifier::new(cfg.clone())),
        _ => Arc::new(LogNotifier),
    }
}

/// Destination used when notifications only go to the log
const LOG_DESTINATION: &str = "log";

/// Routes hot-lead notifications to the right destination off the caller's thread
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    runner: Arc<dyn TaskRunner>,
    config: NotifierConfig,
    metrics: Arc<MetricsRegistry>,
    log_only: bool,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        runner: Arc<dyn TaskRunner>,
        config: Option<NotifierConfig>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            notifier,
            runner,
            log_only: config.is_none(),
            config: config.unwrap_or_default(),
            metrics,
        }
    }

    /// Link for a lead, if a link base is configured
    pub fn lead_link(&self, tenant_id: &str, lead_id: u64) -> Option<String> {
        self.config.lead_link(tenant_id, lead_id)
    }

    /// Queues one notification. Never fails.
    pub fn dispatch(&self, notification: Notification) {
        let destination = match self.config.destination_for(&notification.tenant_id) {
            Some(destination) => destination.to_string(),
            None if self.log_only => LOG_DESTINATION.to_string(),
            None => {
                self.metrics.increment_notifications_failed();
                warn!(
                    event = %Event::NotificationFailed,
                    tenant_id = %notification.tenant_id,
                    lead_id = notification.lead_id,
                    error = "no destination configured"
                );
                return;
            }
        };

        let notifier = Arc::clone(&self.notifier);
        let metrics = Arc::clone(&self.metrics);
        self.runner.spawn(
            "notify",
            Box::new(move || match notifier.notify(&destination, &notification) {
                Ok(()) => metrics.increment_notifications_sent(),
                Err(e) => {
                    metrics.increment_notifications_failed();
                    warn!(
                        event = %Event::NotificationFailed,
                        tenant_id = %notification.tenant_id,
                        lead_id = notification.lead_id,
                        error = %e
                    );
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::InlineRunner;

    fn notification() -> Notification {
        Notification {
            tenant_id: "acme".to_string(),
            lead_id: 7,
            probability: 0.83,
            link: Some("https://app.example/leads/acme/7".to_string()),
        }
    }

    fn dispatcher(
        notifier: Arc<RecordingNotifier>,
        config: Option<NotifierConfig>,
    ) -> (NotificationDispatcher, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let dispatcher = NotificationDispatcher::new(
            notifier,
            Arc::new(InlineRunner),
            config,
            Arc::clone(&metrics),
        );
        (dispatcher, metrics)
    }

    #[test]
    fn test_destination_resolution() {
        let mut config = NotifierConfig {
            default_destination: Some("sales@example.com".to_string()),
            ..NotifierConfig::default()
        };
        config
            .tenant_destinations
            .insert("acme".to_string(), "acme@example.com".to_string());

        assert_eq!(config.destination_for("acme"), Some("acme@example.com"));
        assert_eq!(config.destination_for("globex"), Some("sales@example.com"));
    }

    #[test]
    fn test_lead_link() {
        let config = NotifierConfig {
            link_base: Some("https://app.example/".to_string()),
            ..NotifierConfig::default()
        };
        assert_eq!(
            config.lead_link("acme", 7).as_deref(),
            Some("https://app.example/leads/acme/7")
        );
        assert!(NotifierConfig::default().lead_link("acme", 7).is_none());
    }

    #[test]
    fn test_message_rendering() {
        let n = notification();
        assert_eq!(n.subject(), "Hot lead #7 (83%)");
        assert!(n.body().contains("0.83"));
        assert!(n.body().contains("https://app.example/leads/acme/7"));
    }

    #[test]
    fn test_dispatch_without_config_goes_to_log_destination() {
        let recorder = Arc::new(RecordingNotifier::new());
        let (dispatcher, metrics) = dispatcher(Arc::clone(&recorder), None);

        dispatcher.dispatch(notification());

        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "log");
        assert_eq!(metrics.snapshot().notifications_sent, 1);
    }

    #[test]
    fn test_dispatch_failure_is_counted_not_raised() {
        let recorder = Arc::new(RecordingNotifier::failing());
        let config = NotifierConfig {
            default_destination: Some("sales@example.com".to_string()),
            ..NotifierConfig::default()
        };
        let (dispatcher, metrics) = dispatcher(recorder, Some(config));

        dispatcher.dispatch(notification());
        assert_eq!(metrics.snapshot().notifications_failed, 1);
        assert_eq!(metrics.snapshot().notifications_sent, 0);
    }

    #[test]
    fn test_missing_destination_is_skipped() {
        let recorder = Arc::new(RecordingNotifier::new());
        let (dispatcher, metrics) =
            dispatcher(Arc::clone(&recorder), Some(NotifierConfig::default()));

        dispatcher.dispatch(notification());
        assert_eq!(recorder.sent_count(), 0);
        assert_eq!(metrics.snapshot().notifications_failed, 1);
    }
}
