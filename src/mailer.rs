//! Transactional email delivery through a Resend-compatible HTTP API.
//!
//! A single attempt per message: no retry and no idempotency key, so calling
//! [`Mailer::send`] twice sends two emails.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Provider key or sender address missing.
    #[error("{0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Email provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message and return the provider's message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

pub struct ResendMailer {
    config: EmailConfig,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    /// A mailer that reports a configuration error on every send.
    pub fn unconfigured() -> Self {
        Self::new(EmailConfig {
            api_url: String::new(),
            api_key: None,
            from_address: None,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            MailError::NotConfigured("RESEND_API_KEY is not configured".into())
        })?;
        let from = self.config.from_address.as_deref().ok_or_else(|| {
            MailError::NotConfigured("EMAIL_FROM is not configured".into())
        })?;

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from,
                to: [email.to.as_str()],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: SendResponse = response.json().await?;
        tracing::debug!(message_id = %body.id, to = %email.to, "email accepted by provider");
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mailer_reports_missing_key() {
        let mailer = ResendMailer::unconfigured();
        let err = mailer
            .send(&OutgoingEmail {
                to: "factory@example.com".into(),
                subject: "Order".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::NotConfigured(msg) if msg.contains("RESEND_API_KEY")));
    }
}
