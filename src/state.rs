use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::providers::ProviderRegistry;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub providers: ProviderRegistry,
    pub login_limiter: LoginRateLimiter,
}
