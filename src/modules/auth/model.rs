use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum UserRole {
    Tutor,
    Student,
    Admin,
    Unknown,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tutor => "TUTOR",
            UserRole::Student => "STUDENT",
            UserRole::Admin => "ADMIN",
            UserRole::Unknown => "UNKNOWN",
        }
    }
}

/// Tutor onboarding pointer. Written once at tutor registration; the
/// onboarding workflow owns every later transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationStage {
    NotStarted,
    InReview,
    Certified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpPurpose {
    MobileVerification,
    EmailVerification,
    WhatsappVerification,
    PasswordReset,
    Other,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::MobileVerification => "MOBILE_VERIFICATION",
            OtpPurpose::EmailVerification => "EMAIL_VERIFICATION",
            OtpPurpose::WhatsappVerification => "WHATSAPP_VERIFICATION",
            OtpPurpose::PasswordReset => "PASSWORD_RESET",
            OtpPurpose::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    /// Unrecognized tags bucket as web.
    pub fn parse(tag: &str) -> Platform {
        match tag {
            "ios" => Platform::Ios,
            "android" => Platform::Android,
            _ => Platform::Web,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub country_code: Option<String>,
    pub mobile: Option<String>,
    /// Only populated by the `*_with_password` lookups; every other read
    /// leaves the column out entirely.
    #[sqlx(default)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub is_signup_complete: bool,
    pub is_active: bool,
    pub is_deleted: bool,
    pub certification_stage: Option<CertificationStage>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Country code and national number combined, e.g. "+911234567890".
    pub fn full_mobile(&self) -> Option<String> {
        match (&self.country_code, &self.mobile) {
            (Some(cc), Some(number)) => Some(format!("{}{}", cc, number)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Option<String>,
    pub country_code: Option<String>,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub certification_stage: Option<CertificationStage>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub platform: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub user_id: i64,
    pub token_hash: String,
    pub platform: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Otp {
    pub id: i64,
    pub user_id: i64,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
