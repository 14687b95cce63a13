use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::services::jwt::AccessClaims;
use crate::AppState;

use super::interface::{AuthError, AuthSession, SessionStats};
use super::schema::{
    AuthResponse, ErrorResponse, ForgotPasswordRequest, HeartbeatResponse, LoginIdentifierRequest,
    LoginRequest, LogoutAllResponse, LogoutRequest, MessageResponse, OtpRequest,
    OtpRequestResponse, OtpVerifyRequest, OtpVerifyResponse, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, UserResponse, ValidateResetTokenRequest, ValidateResetTokenResponse,
};
use super::service::{LoginIdentifier, RegisterInput};

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(err: AuthError) -> ErrorReply {
    let status = err.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(%err, "auth request failed");
        (status, Json(ErrorResponse::new("Internal server error")))
    } else {
        (status, Json(ErrorResponse::new(err.to_string())))
    }
}

fn validation_reply(err: validator::ValidationErrors) -> ErrorReply {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err.to_string())))
}

fn bearer_claims(state: &AppState, headers: &HeaderMap) -> Result<AccessClaims, ErrorReply> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Missing bearer token")),
            )
        })?;
    state.sessions.verify_access_token(token).map_err(error_reply)
}

fn auth_response(session: AuthSession) -> AuthResponse {
    AuthResponse {
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
        token_type: "Bearer",
        expires_in: session.tokens.expires_in,
        user: UserResponse::from(&session.user),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ErrorReply> {
    req.validate().map_err(validation_reply)?;

    let session = state
        .auth
        .register(RegisterInput {
            role: req.role,
            email: req.email,
            country_code: req.country_code,
            mobile: req.mobile,
            password: req.password,
            platform: req.platform,
        })
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::CREATED, Json(auth_response(session))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ErrorReply> {
    let identifier = match req.identifier {
        LoginIdentifierRequest::Email { value } => LoginIdentifier::Email(value),
        LoginIdentifierRequest::Mobile {
            country_code,
            number,
        } => LoginIdentifier::Mobile {
            country_code,
            number,
        },
    };

    let session = state
        .auth
        .login(identifier, &req.password, req.platform)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(auth_response(session))))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ErrorReply> {
    let session = state
        .auth
        .refresh(&req.refresh_token)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(auth_response(session))))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ErrorReply> {
    state
        .auth
        .logout(&req.refresh_token)
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out",
        }),
    ))
}

pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<LogoutAllResponse>), ErrorReply> {
    let claims = bearer_claims(&state, &headers)?;

    let revoked = state
        .auth
        .logout_all(claims.sub)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(LogoutAllResponse { revoked })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<UserResponse>), ErrorReply> {
    let claims = bearer_claims(&state, &headers)?;

    let user = state
        .auth
        .current_user(claims.sub)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(UserResponse::from(&user))))
}

pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<(StatusCode, Json<OtpRequestResponse>), ErrorReply> {
    let issued = state
        .otp
        .generate(req.user_id, req.purpose)
        .await
        .map_err(error_reply)?;

    // The plaintext goes to the delivery collaborator, not into the
    // response body.
    state.delivery.send_otp(
        issued.user_id,
        issued.purpose.as_str(),
        &issued.code,
        issued.expires_at,
    );

    Ok((
        StatusCode::OK,
        Json(OtpRequestResponse {
            message: "Verification code sent",
            expires_at: issued.expires_at,
        }),
    ))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpVerifyRequest>,
) -> Result<(StatusCode, Json<OtpVerifyResponse>), ErrorReply> {
    let outcome = state
        .otp
        .verify(req.user_id, req.purpose, &req.timestamp, &req.code)
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::OK,
        Json(OtpVerifyResponse {
            success: outcome.success,
            message: outcome.message,
        }),
    ))
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<HeartbeatResponse>), ErrorReply> {
    let claims = bearer_claims(&state, &headers)?;

    let session_id = claims.sid.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Token carries no session")),
        )
    })?;

    let recorded = state
        .sessions
        .record_activity(session_id)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(HeartbeatResponse { recorded })))
}

pub async fn session_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SessionStats>), ErrorReply> {
    bearer_claims(&state, &headers)?;

    let stats = state
        .sessions
        .session_stats()
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(stats)))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ErrorReply> {
    req.validate().map_err(validation_reply)?;

    state
        .auth
        .forgot_password(&req.email)
        .await
        .map_err(error_reply)?;

    // Same response whether or not the address holds an account.
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "If the account exists, a reset link has been sent",
        }),
    ))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ErrorReply> {
    req.validate().map_err(validation_reply)?;

    state
        .auth
        .reset_password(&req.token, &req.password)
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password updated",
        }),
    ))
}

pub async fn validate_reset_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateResetTokenRequest>,
) -> Result<(StatusCode, Json<ValidateResetTokenResponse>), ErrorReply> {
    let valid = state
        .auth
        .validate_reset_token(&req.token)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::OK, Json(ValidateResetTokenResponse { valid })))
}
