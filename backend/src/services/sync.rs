use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::core::{DbContext, DbError, ShopDomain};
use crate::db;
use crate::shopify::{MAX_IMAGES_PER_LINE_ITEM, ShopifyError};

#[rustfmt::skip]
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Shopify credentials not configured. Using demo data.")]
    NotConfigured,

    #[error("Shop '{0}' not authenticated. Please connect your store first.")]
    NotAuthenticated(String),

    #[error("Order '{0}' must be reconciled before its line items")]
    OrderNotReconciled(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ShopifyError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        tracing::error!("Sync error: {}", self);
        let details = self.to_string();
        let (status, body) = match self {
            Self::NotConfigured => (StatusCode::BAD_REQUEST, json!({ "error": details, "demo": true })),
            Self::NotAuthenticated(_) => (StatusCode::NOT_FOUND, json!({ "error": details, "needsAuth": true })),
            Self::Upstream(ShopifyError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Store authentication expired. Please reconnect your store.", "needsAuth": true, "details": details }),
            ),
            Self::Upstream(ShopifyError::ShopNotFound(_)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Store not found or access denied.", "details": details }),
            ),
            Self::Upstream(ShopifyError::Transport(_)) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Network error connecting to Shopify. Please try again later.", "details": details }),
            ),
            Self::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Error fetching data from Shopify API. Please try again later.", "details": details }),
            ),
            Self::OrderNotReconciled(_) | Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to sync orders", "details": details }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Outcome of one reconciliation pass. Failed records are logged individually.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl ReconcileSummary {
    #[must_use]
    pub const fn stored(&self) -> usize {
        self.attempted - self.failed
    }
}

/// Upserts every order keyed on `(shop, order_id)`. One bad record never aborts the batch.
pub async fn reconcile(db: &DbContext, shop: &ShopDomain, orders: &[db::OrderRecord]) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    for order in orders {
        summary.attempted += 1;
        if order.shop != shop.as_str() {
            tracing::warn!(shop = %shop, order_shop = order.shop, order_id = order.order_id, "Skipping order of another shop");
            summary.failed += 1;
            continue;
        }
        if let Err(e) = db::upsert_order(db, order).await {
            tracing::error!(shop = %shop, order_id = order.order_id, "Error storing order: {}", e);
            summary.failed += 1;
        }
    }

    tracing::info!(shop = %shop, stored = summary.stored(), failed = summary.failed, "Reconciled orders");
    summary
}

/// Upserts the line items of an already stored order and attaches up to three images to each.
/// Duplicate images are skipped silently.
pub async fn reconcile_order_detail(
    db: &DbContext,
    shop: &ShopDomain,
    order_id: &str,
    line_items: &[db::LineItemRecord],
) -> Result<ReconcileSummary, SyncError> {
    let order_row_id = db::get_order_row_id(db, shop, order_id)
        .await?
        .ok_or_else(|| SyncError::OrderNotReconciled(order_id.to_string()))?;

    let mut summary = ReconcileSummary::default();
    for item in line_items {
        summary.attempted += 1;
        let line_item_row_id = match db::upsert_line_item(db, order_row_id, item).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(shop = %shop, order_id, line_item_id = item.line_item_id, "Error storing line item: {}", e);
                summary.failed += 1;
                continue;
            }
        };

        for url in item.images.iter().take(MAX_IMAGES_PER_LINE_ITEM) {
            if let Err(e) = db::insert_image(db, url, Some(line_item_row_id)).await {
                tracing::warn!(shop = %shop, order_id, line_item_id = item.line_item_id, "Could not store image: {}", e);
            }
        }
    }

    tracing::debug!(shop = %shop, order_id, stored = summary.stored(), failed = summary.failed, "Reconciled line items");
    Ok(summary)
}
