pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{Config, DbPool};
use modules::auth::auth_routes;
use modules::auth::crud::{
    MySqlOtpRepository, MySqlPasswordResetRepository, MySqlRefreshSessionRepository,
    MySqlUserRepository,
};
use modules::auth::interface::{
    OtpRepository, PasswordResetRepository, RefreshSessionRepository, UserRepository,
};
use modules::auth::otp::OtpService;
use modules::auth::service::AuthOrchestrator;
use modules::auth::session::{SessionConfig, SessionManager};
use services::analytics::AnalyticsClient;
use services::delivery::DeliveryClient;
use services::jwt::JwtService;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

pub struct AppState {
    pub auth: AuthOrchestrator,
    pub otp: OtpService,
    pub sessions: Arc<SessionManager>,
    pub delivery: DeliveryClient,
}

pub async fn create_app(db: DbPool, config: &Config) -> Router {
    let users: Arc<dyn UserRepository> = Arc::new(MySqlUserRepository::new(db.clone()));
    let refresh_sessions: Arc<dyn RefreshSessionRepository> =
        Arc::new(MySqlRefreshSessionRepository::new(db.clone()));
    let otps: Arc<dyn OtpRepository> = Arc::new(MySqlOtpRepository::new(db.clone()));
    let resets: Arc<dyn PasswordResetRepository> =
        Arc::new(MySqlPasswordResetRepository::new(db));

    let jwt = JwtService::new(config.jwt_secret.clone(), config.access_token_ttl_secs);
    let sessions = Arc::new(SessionManager::new(
        users.clone(),
        refresh_sessions,
        jwt,
        SessionConfig::new(
            config.refresh_token_ttl_secs,
            config.heartbeat_throttle_secs,
            config.inactivity_window_secs,
        ),
    ));

    let analytics = AnalyticsClient::new(config.analytics_url.clone());
    let delivery = DeliveryClient::new(config.delivery_url.clone());

    let otp = OtpService::new(users.clone(), otps, config.otp_ttl_secs);
    let auth = AuthOrchestrator::new(
        users,
        resets,
        sessions.clone(),
        analytics,
        delivery.clone(),
        config.reset_token_ttl_secs,
    );

    let state = Arc::new(AppState {
        auth,
        otp,
        sessions,
        delivery,
    });

    // Blunt global brake; per-account throttling belongs to the gateway.
    let rate_limiter = create_rate_limiter(60, 20);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "TutorLink Platform API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
