use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use crate::cfg;
use crate::core::ShopDomain;
use crate::db::{LineItemRecord, OrderDetail, OrderRecord};
use crate::shopify::dto::{GraphQlResponse, OrderData, OrdersData, ProductImages};
use crate::shopify::{ShopifyError, queries};

/// Newest orders fetched per sync. Only the first page is read.
pub const RECENT_ORDERS_PAGE_SIZE: u32 = 250;
/// Line items fetched with an order's detail.
pub const ORDER_LINE_ITEMS_LIMIT: u32 = 50;
/// Images kept per line item.
pub const MAX_IMAGES_PER_LINE_ITEM: usize = 3;

/// Read-only client for the Admin API of one shop at a time, authenticated with a stored credential.
#[derive(Clone, Copy)]
pub struct ShopifyClient<'a> {
    http: &'a reqwest::Client,
    settings: &'a cfg::ShopifySettings,
}

impl<'a> ShopifyClient<'a> {
    #[must_use]
    pub const fn new(http: &'a reqwest::Client, settings: &'a cfg::ShopifySettings) -> Self {
        Self { http, settings }
    }

    /// Newest orders first, up to [`RECENT_ORDERS_PAGE_SIZE`].
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn fetch_recent_orders(&self, shop: &ShopDomain, access_token: &str) -> Result<Vec<OrderRecord>, ShopifyError> {
        let data: OrdersData = self
            .graphql(shop, access_token, queries::RECENT_ORDERS_QUERY, json!({ "first": RECENT_ORDERS_PAGE_SIZE }))
            .await?;

        if data.orders.page_info.as_ref().is_some_and(|p| p.has_next_page) {
            tracing::debug!(shop = %shop, "More orders available upstream; only the first page is mirrored");
        }

        let orders = data
            .orders
            .edges
            .into_iter()
            .map(|edge| edge.node.into_record(shop))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(shop = %shop, count = orders.len(), "Fetched recent orders from Shopify");
        Ok(orders)
    }

    /// One order with up to [`ORDER_LINE_ITEMS_LIMIT`] line items and both addresses.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn fetch_order_detail(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        order_id: &str,
    ) -> Result<OrderDetail, ShopifyError> {
        let variables = json!({
            "id": format!("gid://shopify/Order/{order_id}"),
            "lineItems": ORDER_LINE_ITEMS_LIMIT,
        });
        let data: OrderData = self
            .graphql(shop, access_token, queries::ORDER_DETAILS_QUERY, variables)
            .await?;
        let mut node = data
            .order
            .ok_or_else(|| ShopifyError::OrderNotFound(order_id.to_string()))?;

        let line_items: Vec<LineItemRecord> = node
            .line_items
            .take()
            .map(|connection| connection.edges.into_iter().map(|edge| edge.node.into_record()).collect())
            .unwrap_or_default();
        let shipping_address = node.shipping_address.clone();
        let billing_address = node.billing_address.clone();
        let order = node.into_record(shop)?;

        tracing::info!(shop = %shop, order_id, line_items = line_items.len(), "Fetched order detail from Shopify");
        Ok(OrderDetail {
            order,
            line_items,
            shipping_address,
            billing_address,
        })
    }

    /// Image URLs of a product, at most [`MAX_IMAGES_PER_LINE_ITEM`].
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn fetch_product_images(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        product_id: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        let url = format!(
            "{}/admin/api/{}/products/{product_id}/images.json",
            self.settings.base_url_for(shop.as_str()),
            self.settings.api_version
        );
        let request = self.http.get(&url).header("X-Shopify-Access-Token", access_token);
        let response = self.with_timeout(request).send().await?;
        let body = check_status(response).await?;
        let images: ProductImages = serde_json::from_str(&body)?;
        Ok(images
            .images
            .into_iter()
            .map(|image| image.src)
            .take(MAX_IMAGES_PER_LINE_ITEM)
            .collect())
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let endpoint = format!(
            "{}/admin/api/{}/graphql.json",
            self.settings.base_url_for(shop.as_str()),
            self.settings.api_version
        );
        let request = self
            .http
            .post(&endpoint)
            .header("X-Shopify-Access-Token", access_token)
            .json(&json!({ "query": query, "variables": variables }));
        let response = self.with_timeout(request).send().await?;
        let body = check_status(response).await?;

        let response: GraphQlResponse<T> = serde_json::from_str(&body)?;
        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::QueryFailed(errors.into_iter().map(|e| e.message).collect()));
        }
        response
            .data
            .ok_or_else(|| ShopifyError::QueryFailed(vec!["No data in response".to_string()]))
    }

    fn with_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.request_timeout_secs {
            0 => request,
            secs => request.timeout(Duration::from_secs(secs)),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Retry-After is a small positive number of seconds
async fn check_status(response: reqwest::Response) -> Result<String, ShopifyError> {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ShopifyError::Unauthorized),
        StatusCode::NOT_FOUND => return Err(ShopifyError::ShopNotFound(response.url().host_str().unwrap_or_default().to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil() as u64);
            return Err(ShopifyError::RateLimited(retry_after));
        }
        _ => {}
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(ShopifyError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
