use std::env;

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default 24h).
    pub access_token_ttl_secs: i64,
    /// Refresh session lifetime in seconds (default 30d).
    pub refresh_token_ttl_secs: i64,
    /// OTP validity window in seconds (default 30min).
    pub otp_ttl_secs: i64,
    /// Password reset token lifetime in seconds (default 1h).
    pub reset_token_ttl_secs: i64,
    /// Minimum gap between two persisted heartbeats for one session.
    pub heartbeat_throttle_secs: i64,
    /// A session idle for longer than this counts as inactive in stats.
    pub inactivity_window_secs: i64,
    pub analytics_url: Option<String>,
    pub delivery_url: Option<String>,
}

fn env_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|_| format!("{} must be an integer, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        Ok(Self {
            database_url,
            jwt_secret,
            access_token_ttl_secs: env_i64("ACCESS_TOKEN_TTL_SECS", 24 * 60 * 60)?,
            refresh_token_ttl_secs: env_i64("REFRESH_TOKEN_TTL_SECS", 30 * 24 * 60 * 60)?,
            otp_ttl_secs: env_i64("OTP_TTL_SECS", 30 * 60)?,
            reset_token_ttl_secs: env_i64("RESET_TOKEN_TTL_SECS", 60 * 60)?,
            heartbeat_throttle_secs: env_i64("HEARTBEAT_THROTTLE_SECS", 60)?,
            inactivity_window_secs: env_i64("INACTIVITY_WINDOW_SECS", 5 * 60)?,
            analytics_url: env::var("ANALYTICS_URL").ok(),
            delivery_url: env::var("DELIVERY_URL").ok(),
        })
    }
}
