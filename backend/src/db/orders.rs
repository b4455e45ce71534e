use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::core::{DbContext, DbError, ShopDomain};
use crate::db::LineItemRecord;
use crate::shopify::MailingAddress;

/// Local snapshot of an upstream order, as stored and as served to the browser.
#[derive(Clone, Debug, PartialEq, Serialize, FromRow)]
pub struct OrderRecord {
    pub shop: String,
    pub order_id: String,
    pub name: String,
    pub status: String,
    pub total_price: String,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub fulfillment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "upstream_updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Raw upstream payload, kept for fields the local schema does not model yet
    #[serde(skip)]
    pub order_data: String,
}

/// An order with its line items, as returned by the detail endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderDetail {
    pub order: OrderRecord,
    #[serde(rename = "items")]
    pub line_items: Vec<LineItemRecord>,
    pub shipping_address: Option<MailingAddress>,
    pub billing_address: Option<MailingAddress>,
}

/// Inserts the order or updates it in place, keyed on `(shop, order_id)`.
/// Returns the local row id, which is stable across updates.
pub async fn upsert_order(db: &DbContext, order: &OrderRecord) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO orders (
            shop, order_id, name, status, total_price, currency, customer_email, customer_name,
            fulfillment_status, created_at, upstream_updated_at, order_data, synced_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (shop, order_id) DO UPDATE SET
            name = excluded.name,
            status = excluded.status,
            total_price = excluded.total_price,
            currency = excluded.currency,
            customer_email = excluded.customer_email,
            customer_name = excluded.customer_name,
            fulfillment_status = excluded.fulfillment_status,
            upstream_updated_at = excluded.upstream_updated_at,
            order_data = excluded.order_data,
            synced_at = excluded.synced_at
        RETURNING id
        "#,
    )
    .bind(&order.shop)
    .bind(&order.order_id)
    .bind(&order.name)
    .bind(&order.status)
    .bind(&order.total_price)
    .bind(&order.currency)
    .bind(&order.customer_email)
    .bind(&order.customer_name)
    .bind(&order.fulfillment_status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(&order.order_data)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn list_orders(db: &DbContext, shop: &ShopDomain) -> Result<Vec<OrderRecord>, DbError> {
    let orders = sqlx::query_as::<_, OrderRecord>(
        r#"
        SELECT shop, order_id, name, status, total_price, currency, customer_email, customer_name,
               fulfillment_status, created_at, upstream_updated_at, order_data
        FROM orders
        WHERE shop = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(shop.as_str())
    .fetch_all(db)
    .await?;
    Ok(orders)
}

/// Returns the local row id together with the order.
pub async fn get_order(
    db: &DbContext,
    shop: &ShopDomain,
    order_id: &str,
) -> Result<Option<(i64, OrderRecord)>, DbError> {
    #[derive(FromRow)]
    struct Row {
        id: i64,
        #[sqlx(flatten)]
        order: OrderRecord,
    }

    let row = sqlx::query_as::<_, Row>(
        r#"
        SELECT id, shop, order_id, name, status, total_price, currency, customer_email, customer_name,
               fulfillment_status, created_at, upstream_updated_at, order_data
        FROM orders
        WHERE shop = ? AND order_id = ?
        "#,
    )
    .bind(shop.as_str())
    .bind(order_id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(|r| (r.id, r.order)))
}

pub async fn get_order_row_id(db: &DbContext, shop: &ShopDomain, order_id: &str) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM orders WHERE shop = ? AND order_id = ?")
        .bind(shop.as_str())
        .bind(order_id)
        .fetch_optional(db)
        .await?;
    Ok(id)
}

/// Stores the addresses from a detail fetch. List upserts never touch these columns.
pub async fn update_order_addresses(
    db: &DbContext,
    shop: &ShopDomain,
    order_id: &str,
    shipping_address: Option<&MailingAddress>,
    billing_address: Option<&MailingAddress>,
) -> Result<bool, DbError> {
    let shipping_address = shipping_address.and_then(|a| serde_json::to_string(a).ok());
    let billing_address = billing_address.and_then(|a| serde_json::to_string(a).ok());

    let result = sqlx::query("UPDATE orders SET shipping_address = ?, billing_address = ? WHERE shop = ? AND order_id = ?")
        .bind(shipping_address)
        .bind(billing_address)
        .bind(shop.as_str())
        .bind(order_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Shipping and billing address of an order. Unreadable stored values count as absent.
pub async fn get_order_addresses(
    db: &DbContext,
    order_row_id: i64,
) -> Result<(Option<MailingAddress>, Option<MailingAddress>), DbError> {
    let row = sqlx::query_as::<_, (Option<String>, Option<String>)>(
        "SELECT shipping_address, billing_address FROM orders WHERE id = ?",
    )
    .bind(order_row_id)
    .fetch_optional(db)
    .await?;

    let parse = |raw: Option<String>| raw.and_then(|json| serde_json::from_str::<MailingAddress>(&json).ok());
    Ok(row.map_or((None, None), |(shipping, billing)| (parse(shipping), parse(billing))))
}
