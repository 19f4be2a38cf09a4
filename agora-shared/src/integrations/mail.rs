/// Transactional email client
///
/// [`EmailTransport`] is the seam the outbox worker sends through.
/// [`HttpMailer`] posts each message as JSON to the mail provider:
///
/// ```text
/// POST {api_url}
/// Authorization: Bearer {api_key}
///
/// { "from": "Agora <no-reply@agora.example>", "to": ["ama@example.com"],
///   "subject": "...", "text": "...", "html": "..." }
/// ```
///
/// [`LogTransport`] only logs; it is used when no API key is configured.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::outbox::OutboxEmail;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport failure talking to the mail API
    #[error("Mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Mail API refused the message
    #[error("Mail provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Delivers one queued email
    async fn send(&self, email: &OutboxEmail) -> Result<(), MailError>;
}

/// Mail provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub api_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    /// Sender, e.g. `Agora <no-reply@agora.example>`
    pub from: String,

    pub timeout_secs: u64,
}

/// Request body sent to the mail API
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// HTTP JSON mail client
pub struct HttpMailer {
    http: reqwest::Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("agora/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn request_body<'a>(&'a self, email: &'a OutboxEmail) -> SendRequest<'a> {
        SendRequest {
            from: &self.config.from,
            to: [&email.recipient],
            subject: &email.subject,
            text: &email.text_body,
            html: email.html_body.as_deref(),
        }
    }
}

#[async_trait]
impl EmailTransport for HttpMailer {
    async fn send(&self, email: &OutboxEmail) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ProviderError>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            warn!(email_id = %email.id, status = status.as_u16(), %message, "Mail provider rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(email_id = %email.id, "Email accepted by provider");
        Ok(())
    }
}

/// Logs emails instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, email: &OutboxEmail) -> Result<(), MailError> {
        info!(
            email_id = %email.id,
            recipient = %email.recipient,
            subject = %email.subject,
            "Email not sent (no mail API configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outbox::OutboxStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn email(html: Option<&str>) -> OutboxEmail {
        OutboxEmail {
            id: Uuid::new_v4(),
            recipient: "ama@example.com".to_string(),
            subject: "Your inquiry was accepted".to_string(),
            text_body: "Open the conversation".to_string(),
            html_body: html.map(str::to_string),
            status: OutboxStatus::Sending,
            attempts: 1,
            last_error: None,
            created_at: Utc::now(),
            sent_at: None,
            claimed_at: Some(Utc::now()),
        }
    }

    fn mailer() -> HttpMailer {
        HttpMailer::new(MailerConfig {
            api_url: "https://mail.example.com/emails".to_string(),
            api_key: "key".to_string(),
            from: "Agora <no-reply@agora.example>".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let mailer = mailer();
        let email = email(Some("<p>Open the conversation</p>"));
        let body = serde_json::to_value(mailer.request_body(&email)).unwrap();

        assert_eq!(body["from"], "Agora <no-reply@agora.example>");
        assert_eq!(body["to"], serde_json::json!(["ama@example.com"]));
        assert_eq!(body["subject"], "Your inquiry was accepted");
        assert_eq!(body["html"], "<p>Open the conversation</p>");
    }

    #[test]
    fn test_request_body_omits_missing_html() {
        let mailer = mailer();
        let email = email(None);
        let body = serde_json::to_value(mailer.request_body(&email)).unwrap();

        assert!(body.get("html").is_none());
    }

    #[tokio::test]
    async fn test_log_transport_succeeds() {
        assert!(LogTransport.send(&email(None)).await.is_ok());
    }
}
