//! Mail delivery for tenant notifications.
//!
//! Supports two providers:
//! - `console`: Logs mails instead of sending them (development)
//! - `sendgrid`: Uses the SendGrid v3 API

use async_trait::async_trait;
use domain::services::{DeliveryError, MailMessage, MailTransport};
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// [`MailTransport`] backed by the configured email provider.
#[derive(Clone)]
pub struct EmailTransport {
    config: EmailConfig,
    client: reqwest::Client,
}

impl EmailTransport {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs the mail.
    fn send_console(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        info!(
            to = %message.to.email,
            to_name = %message.to.name,
            reply_to = %message.reply_to.email,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body = %message.body, "Email body");
        Ok(())
    }

    fn sendgrid_body(&self, message: &MailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{
                "to": [{ "email": message.to.email, "name": message.to.name }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "reply_to": {
                "email": message.reply_to.email,
                "name": message.reply_to.name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body
            }]
        })
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(DeliveryError("SendGrid API key is not configured".to_string()));
        }

        let response = self
            .client
            .post(&self.config.sendgrid_api_url)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&self.sendgrid_body(message))
            .send()
            .await
            .map_err(|e| DeliveryError(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to.email, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(DeliveryError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl MailTransport for EmailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        if !self.config.enabled {
            debug!(
                to = %message.to.email,
                subject = %message.subject,
                "Email disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(DeliveryError(format!("unknown email provider '{}'", provider)))
            }
        }
    }
}
