use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::core;

const WINDOW_DURATION: Duration = Duration::from_secs(60);

/// Rate limiting entry for tracking requests
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client IP. Process-local.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    /// `max_requests` per minute; 0 disables limiting.
    #[must_use]
    pub fn new(max_requests: u32) -> Self {
        Self {
            max_requests,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Counts one request for `key` and reports whether it is still within budget.
    pub async fn check(&self, key: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }

        let now = Instant::now();
        let mut limiter = self.entries.write().await;

        // Clean up expired entries
        limiter.retain(|_, entry| now.duration_since(entry.window_start) <= WINDOW_DURATION);

        let entry = limiter.entry(key.to_string()).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_start: now,
        });

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_requests
    }
}

/// Rate limiting middleware for the OAuth endpoints
pub async fn auth_rate_limit_middleware(State(context): State<core::ArcContext>, req: Request, next: Next) -> Response {
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string());

    if !context.rate_limiter.check(&client_ip).await {
        tracing::warn!(client_ip, path = req.uri().path(), "Auth rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(serde_json::json!({ "error": "Too many authentication attempts, try again later" })),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requests_over_budget_are_rejected_per_key() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn zero_budget_disables_limiting() {
        let limiter = RateLimiter::new(0);
        for _ in 0..100 {
            assert!(limiter.check("10.0.0.1").await);
        }
    }
}
