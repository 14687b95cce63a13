use chrono::{DateTime, Utc};
use serde_json::json;

/// Hand-off point to the external message-delivery collaborator (email,
/// SMS, WhatsApp). This service only forwards the plaintext credential
/// once, at generation time; channel selection and retries live on the
/// other side of the boundary.
#[derive(Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl DeliveryClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Forwards a freshly generated OTP for delivery to the user.
    pub fn send_otp(
        &self,
        user_id: i64,
        purpose: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) {
        self.post(
            "otp",
            json!({
                "userId": user_id,
                "purpose": purpose,
                "code": code,
                "expiresAt": expires_at,
            }),
        );
    }

    /// Forwards a password-reset token for delivery to the given address.
    pub fn send_password_reset(&self, email: &str, token: &str, expires_at: DateTime<Utc>) {
        self.post(
            "password-reset",
            json!({
                "email": email,
                "token": token,
                "expiresAt": expires_at,
            }),
        );
    }

    fn post(&self, kind: &'static str, payload: serde_json::Value) {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!(kind, "delivery endpoint not configured, dropping message");
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(kind, status = %response.status(), "delivery endpoint rejected message");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(kind, %err, "message delivery failed");
                }
            }
        });
    }
}
