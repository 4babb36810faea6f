//! Email transports.
//!
//! `HttpMailTransport` posts JSON to a transactional mail API (Resend,
//! Postmark and friends all accept roughly this shape). `LogTransport` is the
//! dry-run fallback used when no API endpoint is configured.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::info;
use serde::Serialize;

use super::message::OutgoingEmail;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

#[derive(Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailTransport {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        from: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build mail HTTP client")?;

        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let payload = MailApiRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let mut request = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("mail API request to {} failed", self.api_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("mail API returned {status}: {}", body.trim());
        }

        Ok(())
    }
}

/// Logs each message instead of sending it.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        info!(
            "[dry-run] reminder to {} | {}\n{}",
            email.to, email.subject, email.body
        );
        Ok(())
    }
}
