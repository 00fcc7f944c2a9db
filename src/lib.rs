pub mod availability;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod sync;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::providers::crewhub::CrewHubClient;
use crate::providers::fieldline::FieldLineClient;
use crate::providers::ProviderRegistry;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    // One client per supported provider, selected by tag at the API boundary
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(CrewHubClient::new()));
    providers.register(Arc::new(FieldLineClient::new()));

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        providers,
        login_limiter: LoginRateLimiter::new(),
    });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
