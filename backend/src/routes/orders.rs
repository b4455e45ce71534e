use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::core::{self, DbError, ShopDomain, ShopDomainError};
use crate::services::orders;

/// Response header naming the tier that produced the body.
pub const DATA_SOURCE_HEADER: &str = "x-data-source";

#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    pub shop: Option<String>,
}

#[rustfmt::skip]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing shop parameter")]
    MissingShop,

    #[error("{0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(
            error_type = %std::any::type_name::<Self>(),
            error_message = %self);

        let status = match self {
            Self::MissingShop | Self::InvalidShop(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "result": "error",
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

fn parse_shop(raw: Option<&str>) -> Result<ShopDomain, ApiError> {
    let raw = raw.filter(|s| !s.trim().is_empty()).ok_or(ApiError::MissingShop)?;
    Ok(ShopDomain::normalize(raw)?)
}

pub async fn list_orders(
    State(context): State<core::ArcContext>,
    Query(query): Query<ShopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = parse_shop(query.shop.as_deref())?;
    let result = orders::list_orders(&context, &shop).await;
    Ok(([(DATA_SOURCE_HEADER, result.source.as_str())], Json(result.data)))
}

pub async fn get_order(
    State(context): State<core::ArcContext>,
    Path(order_id): Path<String>,
    Query(query): Query<ShopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = parse_shop(query.shop.as_deref())?;
    let result = orders::get_order_detail(&context, &shop, order_id.trim()).await;
    Ok(([(DATA_SOURCE_HEADER, result.source.as_str())], Json(result.data)))
}

pub async fn sync_orders(State(context): State<core::ArcContext>, Json(body): Json<SyncRequest>) -> Result<Response, Response> {
    let shop = parse_shop(body.shop.as_deref()).map_err(IntoResponse::into_response)?;
    let outcome = orders::manual_sync(&context, &shop)
        .await
        .map_err(IntoResponse::into_response)?;

    tracing::info!(shop = %shop, count = outcome.count, failed = outcome.failed, "Manual sync finished");
    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully synced {} orders from Shopify", outcome.count),
        "count": outcome.count,
        "failed": outcome.failed,
        "shop": outcome.shop,
    }))
    .into_response())
}

pub async fn auth_status(
    State(context): State<core::ArcContext>,
    Query(query): Query<ShopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = parse_shop(query.shop.as_deref())?;
    let status = orders::auth_status(&context, &shop).await?;
    Ok(Json(status))
}
