//! Change capture for visit rows.
//!
//! When a visit is updated through the API, the before and after
//! snapshots are posted to a configured webhook endpoint with the shared
//! secret header. Emission is best effort: a failed post is logged and
//! the originating request still succeeds.

use serde_json::json;

use crate::config::Config;
use crate::models::Visit;

pub struct ChangeEmitter {
    endpoint: Option<String>,
    secret: String,
    client: reqwest::Client,
}

impl ChangeEmitter {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: config.changefeed_url.clone(),
            secret: config.webhook_secret.clone(),
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Post an UPDATE event for a visit row. Never fails the caller.
    pub async fn emit_visit_update(&self, before: &Visit, after: &Visit) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        let payload = json!({
            "type": "UPDATE",
            "table": "visits",
            "record": after,
            "old_record": before,
        });

        let result = self
            .client
            .post(endpoint)
            .header("x-webhook-secret", &self.secret)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(visit_id = %after.id, "Change event delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    visit_id = %after.id,
                    status = %response.status(),
                    "Change event rejected by receiver"
                );
            }
            Err(e) => {
                tracing::warn!(visit_id = %after.id, error = %e, "Change event delivery failed");
            }
        }
    }
}
