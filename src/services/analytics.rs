use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

/// Fire-and-forget product analytics.
/// Delivery runs in the background; a failed emit is logged and never
/// surfaced to the request that produced it.
#[derive(Clone)]
pub struct AnalyticsClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub user_id: i64,
    pub properties: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(name: &'static str, user_id: i64) -> Self {
        Self {
            name,
            user_id,
            properties: json!({}),
            created_at: Utc::now(),
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }
}

impl AnalyticsClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Queues the event for delivery and returns immediately.
    pub fn track(&self, event: AnalyticsEvent) {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!(event = event.name, "analytics endpoint not configured, dropping event");
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&event).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(
                        event = event.name,
                        status = %response.status(),
                        "analytics endpoint rejected event"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(event = event.name, %err, "analytics delivery failed");
                }
            }
        });
    }
}
