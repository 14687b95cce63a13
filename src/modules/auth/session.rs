use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::services::jwt::{AccessClaims, JwtService};
use crate::services::otp as codes;

use super::interface::{
    AuthError, RefreshSessionRepository, Result, SessionStats, TokenPair, UserRepository,
};
use super::model::{NewRefreshSession, Platform, User, UserRole};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub refresh_ttl: Duration,
    pub heartbeat_throttle: Duration,
    pub inactivity_window: Duration,
}

impl SessionConfig {
    pub fn new(
        refresh_ttl_secs: i64,
        heartbeat_throttle_secs: i64,
        inactivity_window_secs: i64,
    ) -> Self {
        Self {
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
            heartbeat_throttle: Duration::seconds(heartbeat_throttle_secs),
            inactivity_window: Duration::seconds(inactivity_window_secs),
        }
    }
}

/// Issues, rotates and revokes refresh sessions, and signs the access
/// tokens bound to them.
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn RefreshSessionRepository>,
    jwt: JwtService,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn RefreshSessionRepository>,
        jwt: JwtService,
        config: SessionConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            jwt,
            config,
        }
    }

    /// Creates a refresh session and signs an access token against it. The
    /// returned refresh secret is the only copy that will ever exist in the
    /// clear.
    pub async fn issue(&self, user: &User, platform: Option<Platform>) -> Result<TokenPair> {
        let now = Utc::now();
        let secret = codes::generate_secret();

        let session = self
            .sessions
            .create(&NewRefreshSession {
                user_id: user.id,
                token_hash: codes::hash_code(&secret),
                platform: platform.map(|p| p.as_str().to_string()),
                expires_at: now + self.config.refresh_ttl,
                last_activity_at: Some(now),
            })
            .await?;

        let access_token = self.sign_for(user, Some(session.id))?;

        Ok(TokenPair {
            access_token,
            refresh_token: secret,
            expires_in: self.jwt.access_token_ttl_secs(),
        })
    }

    /// Exchanges a still-valid refresh secret for a fresh session. The
    /// presented session is left untouched and stays usable until its own
    /// expiry, so several tabs or devices can refresh off one secret
    /// without coordinating.
    pub async fn rotate(
        &self,
        raw_refresh_secret: &str,
        platform_override: Option<Platform>,
    ) -> Result<TokenPair> {
        let session = self
            .sessions
            .find_active_by_token_hash(&codes::hash_code(raw_refresh_secret))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if Utc::now() > session.expires_at {
            return Err(AuthError::Expired("Refresh token has expired".to_string()));
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| {
                AuthError::Authentication("Session owner no longer exists".to_string())
            })?;

        let platform =
            platform_override.or_else(|| session.platform.as_deref().map(Platform::parse));

        self.issue(&user, platform).await
    }

    /// Revokes the session matching the given secret. Unknown secrets are a
    /// no-op.
    pub async fn revoke(&self, raw_refresh_secret: &str) -> Result<()> {
        self.sessions
            .revoke(&codes::hash_code(raw_refresh_secret), Utc::now())
            .await
    }

    /// Revokes every live session the user holds; returns how many.
    pub async fn revoke_all(&self, user_id: i64) -> Result<u64> {
        let revoked = self
            .sessions
            .revoke_all_for_user(user_id, Utc::now())
            .await?;
        tracing::info!(user_id, revoked, "revoked all sessions for user");
        Ok(revoked)
    }

    /// Signature and expiry check. Malformed, tampered and expired tokens
    /// all collapse to the same invalid-token failure.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        self.jwt
            .verify_access_token(token)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Heartbeat. Writes at most once per throttle window per session to
    /// keep write volume bounded under aggressive client polling; returns
    /// whether this call persisted anything.
    pub async fn record_activity(&self, session_id: i64) -> Result<bool> {
        let now = Utc::now();
        self.sessions
            .touch_activity(session_id, now, now - self.config.heartbeat_throttle)
            .await
    }

    /// Active/inactive partition over every live session, plus per-platform
    /// counts. A session with no heartbeat yet is judged by its creation
    /// time.
    pub async fn session_stats(&self) -> Result<SessionStats> {
        let now = Utc::now();
        let live = self.sessions.list_live(now).await?;
        let threshold = now - self.config.inactivity_window;

        let mut stats = SessionStats::default();
        for session in &live {
            stats.total += 1;
            let last_seen = session.last_activity_at.unwrap_or(session.created_at);
            if last_seen >= threshold {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            let platform = Platform::parse(session.platform.as_deref().unwrap_or(""));
            *stats
                .by_platform
                .entry(platform.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Owning user of the session behind a raw secret, if it still resolves.
    pub async fn session_owner(&self, raw_refresh_secret: &str) -> Result<Option<i64>> {
        Ok(self
            .sessions
            .find_active_by_token_hash(&codes::hash_code(raw_refresh_secret))
            .await?
            .map(|session| session.user_id))
    }

    fn sign_for(&self, user: &User, session_id: Option<i64>) -> Result<String> {
        let mobile = user.full_mobile();
        let login_id = match user.role {
            UserRole::Admin => user.email.clone().unwrap_or_default(),
            _ => mobile.clone().unwrap_or_default(),
        };
        self.jwt
            .create_access_token(
                user.id,
                session_id,
                user.email.as_deref(),
                mobile.as_deref(),
                user.role.as_str(),
                &login_id,
            )
            .map_err(|err| AuthError::Internal(err.to_string()))
    }
}
