use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: i64,           // user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<i64>,   // backing refresh session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub role: String,
    #[serde(rename = "loginId")]
    pub login_id: String,
    pub exp: i64,           // expiration time
    pub iat: i64,           // issued at
    pub jti: String,        // unique token id
}

pub struct JwtService {
    secret: String,
    access_token_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: String, access_token_ttl_secs: i64) -> Self {
        Self {
            secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_access_token(
        &self,
        user_id: i64,
        session_id: Option<i64>,
        email: Option<&str>,
        mobile: Option<&str>,
        role: &str,
        login_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + self.access_token_ttl;

        let claims = AccessClaims {
            sub: user_id,
            sid: session_id,
            email: email.map(str::to_string),
            mobile: mobile.map(str::to_string),
            role: role.to_string(),
            login_id: login_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify_access_token(
        &self,
        token: &str,
    ) -> Result<TokenData<AccessClaims>, jsonwebtoken::errors::Error> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
    }

    pub fn access_token_ttl_secs(&self) -> i64 {
        self.access_token_ttl.num_seconds()
    }
}
