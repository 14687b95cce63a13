use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::services::otp as codes;

use super::interface::{
    AuthError, IssuedOtp, OtpRepository, OtpVerification, Result, UserRepository,
};
use super::model::OtpPurpose;

/// One-time passcodes scoped to (user, purpose).
pub struct OtpService {
    users: Arc<dyn UserRepository>,
    otps: Arc<dyn OtpRepository>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(users: Arc<dyn UserRepository>, otps: Arc<dyn OtpRepository>, ttl_secs: i64) -> Self {
        Self {
            users,
            otps,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Generates a fresh code for (user, purpose), replacing whatever code
    /// was outstanding for that pair. The plaintext goes back to the caller
    /// once, for hand-off to the delivery collaborator; only the hash is
    /// stored.
    pub async fn generate(&self, user_id: i64, purpose: OtpPurpose) -> Result<IssuedOtp> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active && !u.is_deleted)
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        let code = codes::generate_code();
        let expires_at = Utc::now() + self.ttl;
        self.otps
            .upsert(user.id, purpose, &codes::hash_code(&code), expires_at)
            .await?;

        tracing::debug!(user_id = user.id, purpose = purpose.as_str(), "issued otp");

        Ok(IssuedOtp {
            user_id: user.id,
            purpose,
            expires_at,
            code,
        })
    }

    /// Checks a submitted code against the stored (user, purpose) row.
    ///
    /// Expiry is judged against the caller-supplied timestamp, not the
    /// server clock. On success the matching verification flag is set, and
    /// signup completes once both flags are true. Re-verifying the same
    /// still-valid code succeeds again; only regeneration retires it.
    pub async fn verify(
        &self,
        user_id: i64,
        purpose: OtpPurpose,
        client_timestamp: &str,
        code: &str,
    ) -> Result<OtpVerification> {
        let otp = self
            .otps
            .find(user_id, purpose)
            .await?
            .ok_or_else(|| AuthError::NotFound("No verification code issued".to_string()))?;

        let at: DateTime<Utc> = DateTime::parse_from_rfc3339(client_timestamp)
            .map_err(|_| {
                AuthError::Validation(format!("Invalid timestamp '{}'", client_timestamp))
            })?
            .with_timezone(&Utc);

        if at > otp.expires_at {
            return Err(AuthError::Expired(
                "Verification code has expired".to_string(),
            ));
        }

        if codes::hash_code(code) != otp.code_hash {
            return Err(AuthError::InvalidCredential(
                "Invalid verification code".to_string(),
            ));
        }

        self.apply_verification(user_id, purpose).await?;

        Ok(OtpVerification {
            success: true,
            message: "Verification successful",
        })
    }

    async fn apply_verification(&self, user_id: i64, purpose: OtpPurpose) -> Result<()> {
        let (proves_mobile, proves_email) = match purpose {
            // A WhatsApp code proves control of the phone number too.
            OtpPurpose::MobileVerification | OtpPurpose::WhatsappVerification => (true, false),
            OtpPurpose::EmailVerification => (false, true),
            OtpPurpose::PasswordReset | OtpPurpose::Other => return Ok(()),
        };

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        let is_mobile_verified = user.is_mobile_verified || proves_mobile;
        let is_email_verified = user.is_email_verified || proves_email;
        // Signup completes once both proofs exist, whatever the role; the
        // flag never regresses.
        let is_signup_complete =
            user.is_signup_complete || (is_mobile_verified && is_email_verified);

        self.users
            .set_verification_flags(
                user.id,
                is_mobile_verified,
                is_email_verified,
                is_signup_complete,
            )
            .await
    }
}
