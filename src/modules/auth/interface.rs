use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{
    NewRefreshSession, NewUser, Otp, OtpPurpose, PasswordResetToken, RefreshSession, User,
};

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_mobile(&self, country_code: &str, mobile: &str) -> Result<Option<User>>;
    /// Same as `find_by_email`, with the password hash column included.
    async fn find_by_email_with_password(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_mobile_with_password(
        &self,
        country_code: &str,
        mobile: &str,
    ) -> Result<Option<User>>;
    async fn set_last_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()>;
    async fn set_verification_flags(
        &self,
        user_id: i64,
        is_mobile_verified: bool,
        is_email_verified: bool,
        is_signup_complete: bool,
    ) -> Result<()>;
    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()>;
}

#[async_trait]
pub trait RefreshSessionRepository: Send + Sync {
    async fn create(&self, session: &NewRefreshSession) -> Result<RefreshSession>;
    /// Matches on the stored hash; revoked rows never match. Expiry is the
    /// caller's to judge so it can report the failure precisely.
    async fn find_active_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshSession>>;
    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()>;
    async fn revoke_all_for_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64>;
    /// Persists a heartbeat only when the stored timestamp is NULL or older
    /// than `stale_before`; returns whether a write happened. Revoked
    /// sessions are never touched.
    async fn touch_activity(
        &self,
        session_id: i64,
        at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool>;
    /// Every non-revoked session that has not yet expired as of `now`.
    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<RefreshSession>>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// At most one row exists per (user, purpose); regeneration replaces the
    /// stored hash and expiry in place.
    async fn upsert(
        &self,
        user_id: i64,
        purpose: OtpPurpose,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn find(&self, user_id: i64, purpose: OtpPurpose) -> Result<Option<Otp>>;
}

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, user_id: i64, token_hash: &str, expires_at: DateTime<Utc>)
        -> Result<()>;
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>>;
    async fn mark_used(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
}

// =============================================================================
// SERVICE RESULT TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    /// Raw refresh secret. Handed to the client exactly once; only its hash
    /// is stored.
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub user_id: i64,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    /// Plaintext code, for the delivery collaborator only.
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct OtpVerification {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Default, Serialize)]
pub struct SessionStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_platform: HashMap<String, u64>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Expired(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("{0}")]
    InvalidCredential(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Expired(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
