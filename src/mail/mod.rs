//! Transactional email delivery.
//!
//! Rendered invoices are always written under `DATA_DIR/emails/` before any
//! delivery attempt, so a provider outage never loses an invoice. Delivery
//! goes through the Brevo transactional HTTP API; without an API key the
//! service runs in outbox-only mode (files on disk, no network).

pub mod render;

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;

const DEFAULT_BREVO_URL: &str = "https://api.brevo.com";
const SEND_ATTEMPTS: u32 = 3;
const SEND_BACKOFF: Duration = Duration::from_millis(800);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct OutboundEmail {
    pub to: String,
    pub from_name: String,
    pub subject: String,
    pub html: String,
}

/// Result of one delivery, including how many attempts it took. Serialized
/// into `email_failed` payment records so the admin listing shows why.
#[derive(Clone, Debug, Serialize)]
pub struct SendResult {
    pub to: String,
    pub success: bool,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

enum Transport {
    Brevo { client: reqwest::Client, api_key: String, base_url: String },
    Outbox,
}

pub struct MailService {
    transport: Transport,
    pub from_email: String,
    pub owner_email: String,
    emails_dir: PathBuf,
    attempts: u32,
    backoff: Duration,
}

impl MailService {
    pub fn from_config(config: &Config) -> Self {
        let transport = if config.brevo_api_key.is_empty() {
            tracing::warn!("BREVO_API_KEY not set; running in outbox-only mail mode");
            Transport::Outbox
        } else {
            let base_url = std::env::var("BREVO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BREVO_URL.to_string());
            Transport::Brevo {
                client: reqwest::Client::builder()
                    .timeout(REQUEST_TIMEOUT)
                    .build()
                    .unwrap_or_default(),
                api_key: config.brevo_api_key.clone(),
                base_url,
            }
        };
        Self {
            transport,
            from_email: config.mail_from.clone(),
            owner_email: config.owner_email.clone(),
            emails_dir: config.data_dir.join("emails"),
            attempts: SEND_ATTEMPTS,
            backoff: SEND_BACKOFF,
        }
    }

    /// Outbox-only service for tests: no delivery, invoices still hit disk.
    pub fn outbox(data_dir: &std::path::Path, from: &str, owner: &str) -> Self {
        Self {
            transport: Transport::Outbox,
            from_email: from.to_string(),
            owner_email: owner.to_string(),
            emails_dir: data_dir.join("emails"),
            attempts: 1,
            backoff: Duration::from_millis(1),
        }
    }

    /// Writes the rendered invoice pair to `emails/{order}-customer.html` and
    /// `emails/{order}-owner.html`.
    pub async fn save_invoice_files(
        &self,
        order_id: &str,
        customer_html: &str,
        owner_html: &str,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.emails_dir).await?;
        tokio::fs::write(
            self.emails_dir.join(format!("{order_id}-customer.html")),
            customer_html,
        )
        .await?;
        tokio::fs::write(self.emails_dir.join(format!("{order_id}-owner.html")), owner_html)
            .await?;
        Ok(())
    }

    /// Delivers with a capped fixed-backoff retry. Never errors; the outcome
    /// carries the failure detail instead.
    pub async fn send_with_retry(&self, email: &OutboundEmail) -> SendResult {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.send_once(email).await {
                Ok(()) => {
                    return SendResult {
                        to: email.to.clone(),
                        success: true,
                        attempt,
                        error: None,
                    };
                }
                Err(err) => {
                    tracing::warn!(to = %email.to, attempt, error = %err, "email send failed");
                    last_error = Some(err);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
        SendResult {
            to: email.to.clone(),
            success: false,
            attempt: self.attempts,
            error: last_error,
        }
    }

    async fn send_once(&self, email: &OutboundEmail) -> std::result::Result<(), String> {
        match &self.transport {
            Transport::Outbox => {
                tracing::debug!(to = %email.to, subject = %email.subject, "outbox mode, delivery skipped");
                Ok(())
            }
            Transport::Brevo { client, api_key, base_url } => {
                let body = serde_json::json!({
                    "sender": { "name": email.from_name, "email": self.from_email },
                    "to": [{ "email": email.to }],
                    "subject": email.subject,
                    "htmlContent": email.html,
                });
                let response = client
                    .post(format!("{base_url}/v3/smtp/email"))
                    .header("api-key", api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if response.status().is_success() {
                    Ok(())
                } else {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    Err(format!("brevo {status}: {detail}"))
                }
            }
        }
    }
}
