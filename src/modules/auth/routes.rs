use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

use super::controller;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/refresh", post(controller::refresh))
        .route("/logout", post(controller::logout))
        .route("/logout-all", post(controller::logout_all))
        .route("/me", get(controller::me))
        .route("/otp/request", post(controller::request_otp))
        .route("/otp/verify", post(controller::verify_otp))
        .route("/heartbeat", post(controller::heartbeat))
        .route("/sessions/stats", get(controller::session_stats))
        .route("/forgot-password", post(controller::forgot_password))
        .route("/reset-password", post(controller::reset_password))
        .route("/validate-reset-token", post(controller::validate_reset_token))
}
