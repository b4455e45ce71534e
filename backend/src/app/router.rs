use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::core;
use crate::middleware::rate_limit;
use crate::routes;

/// Back end server built from the OAuth routes, the order API and the static front-end bundle.
pub fn create_router(context: core::ArcContext) -> Router {
    // OAuth routes, rate limited per client IP
    let auth_routes = Router::new()
        .route("/auth", get(routes::auth::begin_auth))
        .route("/auth/callback", get(routes::auth::auth_callback))
        .layer(middleware::from_fn_with_state(context.clone(), rate_limit::auth_rate_limit_middleware))
        .with_state(context.clone());

    let api_routes = Router::new()
        .route("/api/orders", get(routes::orders::list_orders))
        .route("/api/orders/{order_id}", get(routes::orders::get_order))
        .route("/api/sync-orders", post(routes::orders::sync_orders))
        .route("/api/auth-status", get(routes::orders::auth_status))
        .with_state(context.clone());

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .with_state(context.clone());

    // SPA: unknown paths get index.html
    let static_dir = std::path::Path::new(&context.settings.server.static_dir);
    let assets = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .merge(auth_routes)
        .merge(api_routes)
        .merge(public_routes)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
}
