//! SMTP delivery through `lettre`

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{Notification, Notifier, NotifierConfig, NotifyError, NotifyResult};

pub struct SmtpNotifier {
    config: NotifierConfig,
}

impl SmtpNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, destination: &str, notification: &Notification) -> NotifyResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("from: {}", e)))?;
        let to: Mailbox = destination
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("to: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self) -> NotifyResult<SmtpTransport> {
        let host = self
            .config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Delivery("smtp_host not configured".to_string()))?;

        if self.config.smtp_user.is_empty() {
            // Unauthenticated local relay
            return Ok(SmtpTransport::builder_dangerous(host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_user.clone(),
            self.config.smtp_password.clone(),
        );
        Ok(SmtpTransport::relay(host)
            .map_err(|e| NotifyError::Delivery(format!("SMTP relay error: {}", e)))?
            .credentials(creds)
            .port(self.config.smtp_port)
            .build())
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, destination: &str, notification: &Notification) -> NotifyResult<()> {
        let message = self.build_message(destination, notification)?;
        self.transport()?
            .send(&message)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(())
    }
}
