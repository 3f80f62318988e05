//! Notification mails sent to FAQ users.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::models::config::TenantSettings;

/// Line break used between the message and the link, kept for mail clients
/// that render the historical template.
const BODY_LINE_BREAK: &str = "\n\r";

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Name + address pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub email: String,
    pub name: String,
}

/// A composed plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub to: Mailbox,
    pub reply_to: Mailbox,
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), DeliveryError>;
}

/// Builds the "your question was answered" mail for a tenant.
pub fn question_answered_message(
    settings: &TenantSettings,
    email: &str,
    user_name: &str,
    answer_url: &str,
) -> MailMessage {
    let title = settings.title();
    MailMessage {
        to: Mailbox {
            email: email.to_string(),
            name: user_name.to_string(),
        },
        reply_to: Mailbox {
            email: settings.admin_email().to_string(),
            name: title.to_string(),
        },
        subject: format!("{} - Your question was answered", title),
        body: format!(
            "The question you asked at {} has been answered:{}{}",
            title, BODY_LINE_BREAK, answer_url
        ),
    }
}

/// Sends notification mails through a [`MailTransport`].
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    pub async fn notify_question_answered(
        &self,
        settings: &TenantSettings,
        email: &str,
        user_name: &str,
        answer_url: &str,
    ) -> Result<(), DeliveryError> {
        let message = question_answered_message(settings, email, user_name, answer_url);
        match self.transport.send(&message).await {
            Ok(()) => {
                tracing::info!(to = %email, "Question-answered notification sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %email, error = %e, "Question-answered notification failed");
                Err(e)
            }
        }
    }
}

/// Transport that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockMailTransport {
    pub simulate_failure: bool,
    sent: Mutex<Vec<MailMessage>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        if self.simulate_failure {
            tracing::warn!(to = %message.to.email, "Mock mail transport simulating failure");
            return Err(DeliveryError("Simulated failure".to_string()));
        }
        tracing::info!(to = %message.to.email, subject = %message.subject, "Mock: Would send mail");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}
