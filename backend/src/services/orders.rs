use chrono::NaiveDateTime;
use serde::Serialize;

use crate::core::{Context, DbError, ShopDomain};
use crate::db::{self, OrderDetail, OrderRecord, ShopCredential};
use crate::services::{demo, sync, sync::SyncError};
use crate::shopify::{MAX_IMAGES_PER_LINE_ITEM, ShopifyClient, ShopifyError};

/// Which tier answered a read request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
    Demo,
}

impl DataSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cache => "cache",
            Self::Demo => "demo",
        }
    }
}

#[derive(Debug)]
pub struct Sourced<T> {
    pub source: DataSource,
    pub data: T,
}

impl<T> Sourced<T> {
    const fn new(source: DataSource, data: T) -> Self {
        Self { source, data }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncOutcome {
    pub shop: String,
    pub count: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub demo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<NaiveDateTime>,
    pub message: String,
}

/// Credential usable for a live call, if any. Lookup failures only skip the live tier.
async fn live_credential(ctx: &Context, shop: &ShopDomain) -> Option<ShopCredential> {
    if !ctx.settings.shopify.is_configured() {
        return None;
    }
    match db::get_credential(&ctx.db, shop).await {
        Ok(credential) => credential.filter(|c| !c.access_token.is_empty()),
        Err(e) => {
            tracing::warn!(shop = %shop, "Credential lookup failed: {}", e);
            None
        }
    }
}

/// Live, then cache, then demo. Never fails.
pub async fn list_orders(ctx: &Context, shop: &ShopDomain) -> Sourced<Vec<OrderRecord>> {
    if let Some(credential) = live_credential(ctx, shop).await {
        let client = ShopifyClient::new(&ctx.http_client, &ctx.settings.shopify);
        match client.fetch_recent_orders(shop, &credential.access_token).await {
            Ok(orders) => {
                sync::reconcile(&ctx.db, shop, &orders).await;
                return Sourced::new(DataSource::Live, orders);
            }
            Err(e) => tracing::warn!(shop = %shop, "Live fetch failed, falling back to cache: {}", e),
        }
    }

    match db::list_orders(&ctx.db, shop).await {
        Ok(orders) if !orders.is_empty() => {
            tracing::debug!(shop = %shop, count = orders.len(), "Serving cached orders");
            return Sourced::new(DataSource::Cache, orders);
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(shop = %shop, "Cache read failed: {}", e),
    }

    tracing::info!(shop = %shop, "Serving demo orders");
    Sourced::new(DataSource::Demo, demo::generate_demo_orders(shop))
}

/// Same three tiers as [`list_orders`] for a single order.
pub async fn get_order_detail(ctx: &Context, shop: &ShopDomain, order_id: &str) -> Sourced<OrderDetail> {
    if let Some(credential) = live_credential(ctx, shop).await {
        match fetch_live_detail(ctx, shop, &credential.access_token, order_id).await {
            Ok(detail) => return Sourced::new(DataSource::Live, detail),
            Err(e) => tracing::warn!(shop = %shop, order_id, "Live detail fetch failed, falling back to cache: {}", e),
        }
    }

    match cached_detail(ctx, shop, order_id).await {
        Ok(Some(detail)) => return Sourced::new(DataSource::Cache, detail),
        Ok(None) => {}
        Err(e) => tracing::warn!(shop = %shop, order_id, "Cache read failed: {}", e),
    }

    tracing::info!(shop = %shop, order_id, "Serving demo order");
    Sourced::new(DataSource::Demo, demo::generate_demo_order(shop, order_id))
}

async fn fetch_live_detail(
    ctx: &Context,
    shop: &ShopDomain,
    access_token: &str,
    order_id: &str,
) -> Result<OrderDetail, ShopifyError> {
    let client = ShopifyClient::new(&ctx.http_client, &ctx.settings.shopify);
    let mut detail = client.fetch_order_detail(shop, access_token, order_id).await?;

    // one product at a time
    for item in &mut detail.line_items {
        let Some(product_id) = item.product_id.as_deref() else {
            continue;
        };
        match client.fetch_product_images(shop, access_token, product_id).await {
            Ok(urls) => {
                for url in urls {
                    if !item.images.contains(&url) {
                        item.images.push(url);
                    }
                }
                item.images.truncate(MAX_IMAGES_PER_LINE_ITEM);
                item.image_url = item.images.first().cloned();
            }
            Err(e) => tracing::debug!(shop = %shop, product_id, "Could not fetch product images: {}", e),
        }
    }

    let summary = sync::reconcile(&ctx.db, shop, std::slice::from_ref(&detail.order)).await;
    if summary.failed == 0 {
        store_detail(ctx, shop, &detail).await;
    }

    Ok(detail)
}

async fn store_detail(ctx: &Context, shop: &ShopDomain, detail: &OrderDetail) {
    let order_id = detail.order.order_id.as_str();
    if let Err(e) = db::update_order_addresses(
        &ctx.db,
        shop,
        order_id,
        detail.shipping_address.as_ref(),
        detail.billing_address.as_ref(),
    )
    .await
    {
        tracing::warn!(shop = %shop, order_id, "Could not store addresses: {}", e);
    }
    if let Err(e) = sync::reconcile_order_detail(&ctx.db, shop, order_id, &detail.line_items).await {
        tracing::warn!(shop = %shop, order_id, "Could not store line items: {}", e);
    }
}

async fn cached_detail(ctx: &Context, shop: &ShopDomain, order_id: &str) -> Result<Option<OrderDetail>, DbError> {
    let Some((row_id, order)) = db::get_order(&ctx.db, shop, order_id).await? else {
        return Ok(None);
    };
    let line_items = db::list_line_items(&ctx.db, row_id).await?;
    let (shipping_address, billing_address) = db::get_order_addresses(&ctx.db, row_id).await?;

    Ok(Some(OrderDetail {
        order,
        line_items,
        shipping_address,
        billing_address,
    }))
}

/// Explicit refresh. Unlike the read paths, failures reach the caller.
pub async fn manual_sync(ctx: &Context, shop: &ShopDomain) -> Result<SyncOutcome, SyncError> {
    if !ctx.settings.shopify.is_configured() {
        return Err(SyncError::NotConfigured);
    }

    let credential = db::get_credential(&ctx.db, shop)
        .await?
        .filter(|c| !c.access_token.is_empty())
        .ok_or_else(|| SyncError::NotAuthenticated(shop.name().to_string()))?;

    tracing::info!(shop = %shop, "Starting manual sync");
    let client = ShopifyClient::new(&ctx.http_client, &ctx.settings.shopify);
    let orders = client.fetch_recent_orders(shop, &credential.access_token).await?;
    let summary = sync::reconcile(&ctx.db, shop, &orders).await;

    Ok(SyncOutcome {
        shop: shop.name().to_string(),
        count: orders.len(),
        failed: summary.failed,
    })
}

pub async fn auth_status(ctx: &Context, shop: &ShopDomain) -> Result<AuthStatus, DbError> {
    if !ctx.settings.shopify.is_configured() {
        return Ok(AuthStatus {
            authenticated: false,
            demo: true,
            shop: None,
            connected_at: None,
            message: "Running in demo mode - Shopify credentials not configured".to_string(),
        });
    }

    let status = match db::get_credential(&ctx.db, shop).await? {
        Some(credential) => AuthStatus {
            authenticated: true,
            demo: false,
            shop: Some(shop.name().to_string()),
            connected_at: Some(credential.connected_at()),
            message: "Store successfully connected to Shopify".to_string(),
        },
        None => AuthStatus {
            authenticated: false,
            demo: false,
            shop: None,
            connected_at: None,
            message: "Store not connected. Please authenticate with Shopify.".to_string(),
        },
    };
    Ok(status)
}
