use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Outbound email delivery abstraction.
///
/// Callers persist their state transition first and treat send failures as
/// non-fatal; a lost mail is recoverable through resend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// Delivers through an HTTP email API (Resend-style JSON endpoint).
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: &str, api_key: &str, from: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Local dev mailer that logs instead of sending real email.
///
/// The body is logged in full: it carries the only copy of the raw
/// verification/reset link, so without it a local signup could never be
/// completed.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, body = %html, "email send stub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_delivers() {
        let mailer = LogMailer;
        let html = "<a href=\"http://localhost:5173/verify-email?token=raw\">Verify</a>";
        assert!(mailer.send("ann@example.com", "Verify", html).await.is_ok());
    }
}
