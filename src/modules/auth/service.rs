use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use crate::services::analytics::{AnalyticsClient, AnalyticsEvent};
use crate::services::delivery::DeliveryClient;
use crate::services::hashing;
use crate::services::otp as codes;

use super::interface::{
    AuthError, AuthSession, PasswordResetRepository, Result, UserRepository,
};
use super::model::{CertificationStage, NewUser, Platform, User, UserRole};
use super::session::SessionManager;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub role: UserRole,
    pub email: Option<String>,
    pub country_code: Option<String>,
    pub mobile: Option<String>,
    pub password: String,
    pub platform: Option<Platform>,
}

/// Explicit login discriminator; callers say what they are presenting
/// instead of the service sniffing the string shape.
#[derive(Debug, Clone)]
pub enum LoginIdentifier {
    Email(String),
    Mobile {
        country_code: String,
        number: String,
    },
}

/// Composes the hasher, session manager and stores into the account flows:
/// register, login, refresh, logout, password recovery.
pub struct AuthOrchestrator {
    users: Arc<dyn UserRepository>,
    resets: Arc<dyn PasswordResetRepository>,
    sessions: Arc<SessionManager>,
    analytics: AnalyticsClient,
    delivery: DeliveryClient,
    reset_ttl: Duration,
}

impl AuthOrchestrator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        resets: Arc<dyn PasswordResetRepository>,
        sessions: Arc<SessionManager>,
        analytics: AnalyticsClient,
        delivery: DeliveryClient,
        reset_ttl_secs: i64,
    ) -> Self {
        Self {
            users,
            resets,
            sessions,
            analytics,
            delivery,
            reset_ttl: Duration::seconds(reset_ttl_secs),
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession> {
        match input.role {
            UserRole::Admin => {
                let email = input
                    .email
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| {
                        AuthError::Validation("Email is required for admin accounts".to_string())
                    })?;
                if self.users.find_by_email(email).await?.is_some() {
                    return Err(AuthError::Conflict("Email already registered".to_string()));
                }
            }
            UserRole::Tutor | UserRole::Student => {
                let (country_code, number) =
                    match (input.country_code.as_deref(), input.mobile.as_deref()) {
                        (Some(cc), Some(n)) if !cc.is_empty() && !n.is_empty() => (cc, n),
                        _ => {
                            return Err(AuthError::Validation(
                                "Mobile number is required".to_string(),
                            ))
                        }
                    };
                if self.users.find_by_mobile(country_code, number).await?.is_some() {
                    return Err(AuthError::Conflict(
                        "Mobile number already registered".to_string(),
                    ));
                }
            }
            UserRole::Unknown => {
                return Err(AuthError::Validation("Unsupported role".to_string()));
            }
        }

        let password_hash = hash_blocking(input.password.clone()).await?;

        let mut user = self
            .users
            .create(&NewUser {
                email: input.email,
                country_code: input.country_code,
                mobile: input.mobile,
                password_hash,
                role: input.role,
                certification_stage: matches!(input.role, UserRole::Tutor)
                    .then_some(CertificationStage::NotStarted),
            })
            .await?;

        let now = Utc::now();
        self.users.set_last_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.sessions.issue(&user, input.platform).await?;

        self.analytics.track(
            AnalyticsEvent::new("user_registered", user.id)
                .with_properties(json!({ "role": user.role.as_str() })),
        );

        Ok(AuthSession { tokens, user })
    }

    pub async fn login(
        &self,
        identifier: LoginIdentifier,
        password: &str,
        platform: Option<Platform>,
    ) -> Result<AuthSession> {
        let user = match &identifier {
            LoginIdentifier::Email(email) => {
                self.users.find_by_email_with_password(email).await?
            }
            LoginIdentifier::Mobile {
                country_code,
                number,
            } => {
                self.users
                    .find_by_mobile_with_password(country_code, number)
                    .await?
            }
        };

        // One message for unknown account and wrong password.
        let mut user = user
            .filter(|u| !u.is_deleted)
            .ok_or_else(|| AuthError::Authentication("Invalid login credentials".to_string()))?;

        let hash = user.password_hash.take().ok_or_else(|| {
            AuthError::Internal("password hash missing from credential lookup".to_string())
        })?;
        if !verify_blocking(password.to_string(), hash).await? {
            return Err(AuthError::Authentication(
                "Invalid login credentials".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AuthError::Authentication("Account is inactive".to_string()));
        }

        let now = Utc::now();
        self.users.set_last_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.sessions.issue(&user, platform).await?;

        self.analytics
            .track(AnalyticsEvent::new("user_logged_in", user.id));

        Ok(AuthSession { tokens, user })
    }

    /// Exchanges a refresh secret for a fresh token pair, then re-resolves
    /// the account from the new token's subject.
    pub async fn refresh(&self, raw_refresh_secret: &str) -> Result<AuthSession> {
        let tokens = self.sessions.rotate(raw_refresh_secret, None).await?;
        let claims = self.sessions.verify_access_token(&tokens.access_token)?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::Authentication("Account no longer exists".to_string()))?;

        self.analytics
            .track(AnalyticsEvent::new("session_refreshed", user.id));

        Ok(AuthSession { tokens, user })
    }

    pub async fn logout(&self, raw_refresh_secret: &str) -> Result<()> {
        // Owner lookup feeds the analytics event only; revocation goes
        // ahead whether or not it resolves.
        match self.sessions.session_owner(raw_refresh_secret).await {
            Ok(Some(user_id)) => {
                self.analytics
                    .track(AnalyticsEvent::new("user_logged_out", user_id));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "could not resolve session owner for logout event");
            }
        }
        self.sessions.revoke(raw_refresh_secret).await
    }

    pub async fn logout_all(&self, user_id: i64) -> Result<u64> {
        let revoked = self.sessions.revoke_all(user_id).await?;
        self.analytics.track(
            AnalyticsEvent::new("user_logged_out_everywhere", user_id)
                .with_properties(json!({ "revoked": revoked })),
        );
        Ok(revoked)
    }

    /// Always reports success so the endpoint cannot be used to probe which
    /// addresses hold accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<bool> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) if !user.is_deleted => user,
            _ => return Ok(true),
        };

        let token = codes::generate_secret();
        let expires_at = Utc::now() + self.reset_ttl;
        self.resets
            .create(user.id, &codes::hash_code(&token), expires_at)
            .await?;

        self.delivery.send_password_reset(email, &token, expires_at);

        Ok(true)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<bool> {
        let record = self
            .resets
            .find_by_token_hash(&codes::hash_code(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.is_used {
            return Err(AuthError::InvalidToken);
        }
        if Utc::now() > record.expires_at {
            return Err(AuthError::Expired("Reset token has expired".to_string()));
        }

        let password_hash = hash_blocking(new_password.to_string()).await?;
        self.users
            .update_password(record.user_id, &password_hash)
            .await?;
        self.resets.mark_used(record.id, Utc::now()).await?;

        Ok(true)
    }

    /// Pure check for the reset form; consumes nothing.
    pub async fn validate_reset_token(&self, token: &str) -> Result<bool> {
        Ok(self
            .resets
            .find_by_token_hash(&codes::hash_code(token))
            .await?
            .map(|record| !record.is_used && Utc::now() <= record.expires_at)
            .unwrap_or(false))
    }

    pub async fn current_user(&self, user_id: i64) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }
}

// Argon2 runs tens of milliseconds per call; keep it off the async
// executor threads.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hashing::hash_password(&password))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))?
        .map_err(|err| AuthError::Internal(err.to_string()))
}

async fn verify_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || hashing::verify_password(&password, &hash))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))?
        .map_err(|err| AuthError::Internal(err.to_string()))
}
