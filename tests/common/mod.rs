use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tutorlink_backend::modules::auth::interface::{
    AuthError, AuthSession, OtpRepository, PasswordResetRepository, RefreshSessionRepository,
    Result, UserRepository,
};
use tutorlink_backend::modules::auth::model::{
    NewRefreshSession, NewUser, Otp, OtpPurpose, PasswordResetToken, Platform, RefreshSession,
    User, UserRole,
};
use tutorlink_backend::modules::auth::otp::OtpService;
use tutorlink_backend::modules::auth::service::{AuthOrchestrator, RegisterInput};
use tutorlink_backend::modules::auth::session::{SessionConfig, SessionManager};
use tutorlink_backend::services::analytics::AnalyticsClient;
use tutorlink_backend::services::delivery::DeliveryClient;
use tutorlink_backend::services::jwt::JwtService;

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================
// The services only see the repository traits, so the whole auth stack runs
// against these without a database.

#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<User>>,
}

#[allow(dead_code)]
impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    pub fn set_active(&self, user_id: i64, active: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }

    pub fn set_deleted(&self, user_id: i64, deleted: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.is_deleted = deleted;
        }
    }

    pub fn set_verified(&self, user_id: i64, mobile: bool, email: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.is_mobile_verified = mobile;
            user.is_email_verified = email;
        }
    }

    // Ordinary reads never carry the hash, matching the column exclusion in
    // the real store.
    fn sanitized(user: &User) -> User {
        let mut user = user.clone();
        user.password_hash = None;
        user
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new: &NewUser) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let user = User {
            id: rows.len() as i64 + 1,
            email: new.email.clone(),
            country_code: new.country_code.clone(),
            mobile: new.mobile.clone(),
            password_hash: Some(new.password_hash.clone()),
            role: new.role,
            is_mobile_verified: false,
            is_email_verified: false,
            is_signup_complete: false,
            is_active: true,
            is_deleted: false,
            certification_stage: new.certification_stage,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(Self::sanitized(&user))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(Self::sanitized))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .map(Self::sanitized))
    }

    async fn find_by_mobile(&self, country_code: &str, mobile: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.country_code.as_deref() == Some(country_code)
                    && u.mobile.as_deref() == Some(mobile)
            })
            .map(Self::sanitized))
    }

    async fn find_by_email_with_password(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_mobile_with_password(
        &self,
        country_code: &str,
        mobile: &str,
    ) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.country_code.as_deref() == Some(country_code)
                    && u.mobile.as_deref() == Some(mobile)
            })
            .cloned())
    }

    async fn set_last_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn set_verification_flags(
        &self,
        user_id: i64,
        is_mobile_verified: bool,
        is_email_verified: bool,
        is_signup_complete: bool,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.is_mobile_verified = is_mobile_verified;
            user.is_email_verified = is_email_verified;
            user.is_signup_complete = is_signup_complete;
        }
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = Some(password_hash.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    rows: Mutex<Vec<RefreshSession>>,
}

#[allow(dead_code)]
impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<RefreshSession> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn set_last_activity(&self, id: i64, at: Option<DateTime<Utc>>) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(session) = rows.iter_mut().find(|s| s.id == id) {
            session.last_activity_at = at;
        }
    }

    pub fn set_expires_at(&self, id: i64, at: DateTime<Utc>) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(session) = rows.iter_mut().find(|s| s.id == id) {
            session.expires_at = at;
        }
    }
}

#[async_trait]
impl RefreshSessionRepository for InMemorySessionRepository {
    async fn create(&self, new: &NewRefreshSession) -> Result<RefreshSession> {
        let mut rows = self.rows.lock().unwrap();
        let session = RefreshSession {
            id: rows.len() as i64 + 1,
            user_id: new.user_id,
            token_hash: new.token_hash.clone(),
            platform: new.platform.clone(),
            expires_at: new.expires_at,
            is_revoked: false,
            revoked_at: None,
            last_activity_at: new.last_activity_at,
            created_at: Utc::now(),
        };
        rows.push(session.clone());
        Ok(session)
    }

    async fn find_active_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshSession>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| !s.is_revoked && s.token_hash == token_hash)
            .cloned())
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(session) = rows
            .iter_mut()
            .find(|s| !s.is_revoked && s.token_hash == token_hash)
        {
            session.is_revoked = true;
            session.revoked_at = Some(at);
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut revoked = 0;
        for session in rows.iter_mut().filter(|s| s.user_id == user_id && !s.is_revoked) {
            session.is_revoked = true;
            session.revoked_at = Some(at);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn touch_activity(
        &self,
        session_id: i64,
        at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.id == session_id && !s.is_revoked) {
            Some(session)
                if session
                    .last_activity_at
                    .map(|last| last < stale_before)
                    .unwrap_or(true) =>
            {
                session.last_activity_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<RefreshSession>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_revoked && s.expires_at > now)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryOtpRepository {
    rows: Mutex<Vec<Otp>>,
}

#[allow(dead_code)]
impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_expires_at(&self, user_id: i64, purpose: OtpPurpose, at: DateTime<Utc>) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(otp) = rows
            .iter_mut()
            .find(|o| o.user_id == user_id && o.purpose == purpose)
        {
            otp.expires_at = at;
        }
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn upsert(
        &self,
        user_id: i64,
        purpose: OtpPurpose,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|o| o.user_id == user_id && o.purpose == purpose)
        {
            Some(otp) => {
                otp.code_hash = code_hash.to_string();
                otp.expires_at = expires_at;
                otp.updated_at = Utc::now();
            }
            None => {
                let now = Utc::now();
                let id = rows.len() as i64 + 1;
                rows.push(Otp {
                    id,
                    user_id,
                    purpose,
                    code_hash: code_hash.to_string(),
                    expires_at,
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        Ok(())
    }

    async fn find(&self, user_id: i64, purpose: OtpPurpose) -> Result<Option<Otp>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.user_id == user_id && o.purpose == purpose)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPasswordResetRepository {
    rows: Mutex<Vec<PasswordResetToken>>,
}

#[allow(dead_code)]
impl InMemoryPasswordResetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for_user(&self, user_id: i64) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryPasswordResetRepository {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(PasswordResetToken {
            id,
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            is_used: false,
            used_at: None,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn mark_used(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|t| t.id == id) {
            Some(token) => {
                token.is_used = true;
                token.used_at = Some(at);
                Ok(())
            }
            None => Err(AuthError::NotFound("reset token not found".to_string())),
        }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

#[allow(dead_code)]
pub struct TestHarness {
    pub users: Arc<InMemoryUserRepository>,
    pub session_rows: Arc<InMemorySessionRepository>,
    pub otp_rows: Arc<InMemoryOtpRepository>,
    pub reset_rows: Arc<InMemoryPasswordResetRepository>,
    pub sessions: Arc<SessionManager>,
    pub otp: OtpService,
    pub auth: AuthOrchestrator,
}

#[allow(dead_code)]
impl TestHarness {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let session_rows = Arc::new(InMemorySessionRepository::new());
        let otp_rows = Arc::new(InMemoryOtpRepository::new());
        let reset_rows = Arc::new(InMemoryPasswordResetRepository::new());

        let jwt = JwtService::new("test-secret-key-for-testing-only".to_string(), 24 * 60 * 60);
        let sessions = Arc::new(SessionManager::new(
            users.clone(),
            session_rows.clone(),
            jwt,
            SessionConfig::new(30 * 24 * 60 * 60, 60, 5 * 60),
        ));

        let otp = OtpService::new(users.clone(), otp_rows.clone(), 30 * 60);
        let auth = AuthOrchestrator::new(
            users.clone(),
            reset_rows.clone(),
            sessions.clone(),
            AnalyticsClient::new(None),
            DeliveryClient::new(None),
            60 * 60,
        );

        Self {
            users,
            session_rows,
            otp_rows,
            reset_rows,
            sessions,
            otp,
            auth,
        }
    }

    pub async fn register_tutor(
        &self,
        country_code: &str,
        number: &str,
        password: &str,
    ) -> AuthSession {
        self.auth
            .register(RegisterInput {
                role: UserRole::Tutor,
                email: None,
                country_code: Some(country_code.to_string()),
                mobile: Some(number.to_string()),
                password: password.to_string(),
                platform: Some(Platform::Web),
            })
            .await
            .expect("tutor registration failed")
    }

    pub async fn register_admin(&self, email: &str, password: &str) -> AuthSession {
        self.auth
            .register(RegisterInput {
                role: UserRole::Admin,
                email: Some(email.to_string()),
                country_code: None,
                mobile: None,
                password: password.to_string(),
                platform: Some(Platform::Web),
            })
            .await
            .expect("admin registration failed")
    }
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}
