use crate::auth;
use crate::cfg;
use crate::core;
use crate::middleware::rate_limit;

pub type ArcContext = std::sync::Arc<Context>;

/// Everything a request needs, built once at start-up and shared through axum state.
#[derive(Clone)]
pub struct Context {
    pub db: core::DbContext,
    pub settings: cfg::AppSettings,
    pub http_client: reqwest::Client,
    pub oauth_states: auth::OAuthStateStore,
    pub rate_limiter: rate_limit::RateLimiter,
}

impl Context {
    #[must_use]
    pub fn new(db: core::DbContext, http_client: reqwest::Client, settings: cfg::AppSettings) -> ArcContext {
        Self {
            db,
            rate_limiter: rate_limit::RateLimiter::new(settings.server.auth_rate_limit_per_minute),
            settings,
            http_client,
            oauth_states: auth::OAuthStateStore::default(),
        }
        .into()
    }
}
