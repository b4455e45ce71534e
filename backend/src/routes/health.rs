use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::core;

pub async fn health_check(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, axum::response::Response> {
    sqlx::query("SELECT 1").execute(&context.db).await.map_err(|e| {
        tracing::error!("Health check failed to reach the database: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status": "ERROR" }))).into_response()
    })?;

    Ok(Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
