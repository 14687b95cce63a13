use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DbPool;

use super::interface::{
    AuthError, OtpRepository, PasswordResetRepository, RefreshSessionRepository, Result,
    UserRepository,
};
use super::model::{
    NewRefreshSession, NewUser, Otp, OtpPurpose, PasswordResetToken, RefreshSession, User,
};

// Ordinary user reads leave the password hash column out; the two
// `*_with_password` lookups are the only place it is selected.
const USER_COLUMNS: &str = "id, email, country_code, mobile, role, is_mobile_verified, \
     is_email_verified, is_signup_complete, is_active, is_deleted, certification_stage, \
     last_login_at, created_at, updated_at";

const USER_COLUMNS_WITH_PASSWORD: &str = "id, email, country_code, mobile, password_hash, role, \
     is_mobile_verified, is_email_verified, is_signup_complete, is_active, is_deleted, \
     certification_stage, last_login_at, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, token_hash, platform, expires_at, is_revoked, \
     revoked_at, last_activity_at, created_at";

pub struct MySqlUserRepository {
    pool: DbPool,
}

impl MySqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, country_code, mobile, password_hash, role, certification_stage)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.country_code)
        .bind(&user.mobile)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.certification_stage)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("user {} vanished after insert", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_mobile(&self, country_code: &str, mobile: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE country_code = ? AND mobile = ?",
            USER_COLUMNS
        ))
        .bind(country_code)
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email_with_password(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS_WITH_PASSWORD
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_mobile_with_password(
        &self,
        country_code: &str,
        mobile: &str,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE country_code = ? AND mobile = ?",
            USER_COLUMNS_WITH_PASSWORD
        ))
        .bind(country_code)
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_last_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_verification_flags(
        &self,
        user_id: i64,
        is_mobile_verified: bool,
        is_email_verified: bool,
        is_signup_complete: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_mobile_verified = ?, is_email_verified = ?, is_signup_complete = ?
            WHERE id = ?
            "#,
        )
        .bind(is_mobile_verified)
        .bind(is_email_verified)
        .bind(is_signup_complete)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct MySqlRefreshSessionRepository {
    pool: DbPool,
}

impl MySqlRefreshSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshSessionRepository for MySqlRefreshSessionRepository {
    async fn create(&self, session: &NewRefreshSession) -> Result<RefreshSession> {
        let result = sqlx::query(
            r#"
            INSERT INTO refresh_sessions (user_id, token_hash, platform, expires_at, last_activity_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(&session.platform)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {} FROM refresh_sessions WHERE id = ?",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AuthError::Internal(format!("session {} vanished after insert", id)))
    }

    async fn find_active_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {} FROM refresh_sessions WHERE token_hash = ? AND is_revoked = FALSE",
            SESSION_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET is_revoked = TRUE, revoked_at = ?
            WHERE token_hash = ? AND is_revoked = FALSE
            "#,
        )
        .bind(at)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET is_revoked = TRUE, revoked_at = ?
            WHERE user_id = ? AND is_revoked = FALSE
            "#,
        )
        .bind(at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn touch_activity(
        &self,
        session_id: i64,
        at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET last_activity_at = ?
            WHERE id = ?
              AND is_revoked = FALSE
              AND (last_activity_at IS NULL OR last_activity_at < ?)
            "#,
        )
        .bind(at)
        .bind(session_id)
        .bind(stale_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<RefreshSession>> {
        let sessions = sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {} FROM refresh_sessions WHERE is_revoked = FALSE AND expires_at > ?",
            SESSION_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }
}

pub struct MySqlOtpRepository {
    pool: DbPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for MySqlOtpRepository {
    async fn upsert(
        &self,
        user_id: i64,
        purpose: OtpPurpose,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otps (user_id, purpose, code_hash, expires_at)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE code_hash = VALUES(code_hash), expires_at = VALUES(expires_at)
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, user_id: i64, purpose: OtpPurpose) -> Result<Option<Otp>> {
        let otp = sqlx::query_as::<_, Otp>(
            r#"
            SELECT id, user_id, purpose, code_hash, expires_at, created_at, updated_at
            FROM otps
            WHERE user_id = ? AND purpose = ?
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(otp)
    }
}

pub struct MySqlPasswordResetRepository {
    pool: DbPool,
}

impl MySqlPasswordResetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetRepository for MySqlPasswordResetRepository {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, is_used, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn mark_used(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE password_reset_tokens SET is_used = TRUE, used_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
