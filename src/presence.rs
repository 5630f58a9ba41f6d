use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Third-party chat-presence registry.
///
/// Upserts are best-effort: callers log failures and carry on, the primary
/// auth flow never depends on this registry answering.
#[async_trait]
pub trait PresenceClient: Send + Sync {
    async fn upsert_user(&self, id: Uuid, name: &str, image: &str) -> anyhow::Result<()>;
}

/// HTTP client for the presence registry.
pub struct HttpPresence {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpPresence {
    pub fn new(endpoint: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl PresenceClient for HttpPresence {
    async fn upsert_user(&self, id: Uuid, name: &str, image: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(format!("{}/users", self.endpoint.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "id": id,
                "name": name,
                "image": image,
            }))
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// No-op registry used when no endpoint is configured.
pub struct NoopPresence;

#[async_trait]
impl PresenceClient for NoopPresence {
    async fn upsert_user(&self, id: Uuid, name: &str, _image: &str) -> anyhow::Result<()> {
        debug!(user_id = %id, name = %name, "presence upsert skipped (no registry configured)");
        Ok(())
    }
}
