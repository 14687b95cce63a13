use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{CertificationStage, OtpPurpose, Platform, User, UserRole};

lazy_static! {
    static ref COUNTRY_CODE_RE: Regex = Regex::new(r"^\+\d{1,4}$").unwrap();
    static ref MOBILE_RE: Regex = Regex::new(r"^\d{6,14}$").unwrap();
}

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub role: UserRole,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *COUNTRY_CODE_RE, message = "Invalid country code"))]
    pub country_code: Option<String>,
    #[validate(regex(path = *MOBILE_RE, message = "Invalid mobile number"))]
    pub mobile: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub platform: Option<Platform>,
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoginIdentifierRequest {
    Email { value: String },
    Mobile { country_code: String, number: String },
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: LoginIdentifierRequest,
    pub password: String,
    pub platform: Option<Platform>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

// =============================================================================
// REFRESH / LOGOUT
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

// =============================================================================
// CURRENT USER
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: Option<String>,
    pub country_code: Option<String>,
    pub mobile: Option<String>,
    pub role: UserRole,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub is_signup_complete: bool,
    pub is_active: bool,
    pub certification_stage: Option<CertificationStage>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            country_code: user.country_code.clone(),
            mobile: user.mobile.clone(),
            role: user.role,
            is_mobile_verified: user.is_mobile_verified,
            is_email_verified: user.is_email_verified,
            is_signup_complete: user.is_signup_complete,
            is_active: user.is_active,
            certification_stage: user.certification_stage,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// OTP
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub user_id: i64,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize)]
pub struct OtpRequestResponse {
    pub message: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub user_id: i64,
    pub purpose: OtpPurpose,
    /// Client-clock timestamp the expiry is judged against, RFC 3339.
    pub timestamp: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct OtpVerifyResponse {
    pub success: bool,
    pub message: &'static str,
}

// =============================================================================
// HEARTBEAT / SESSION STATS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    /// False when the throttle window swallowed the write.
    pub recorded: bool,
}

// =============================================================================
// PASSWORD RESET
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateResetTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResetTokenResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}
