use std::collections::HashMap;

use serde::Serialize;
use sqlx::FromRow;

use crate::core::{DbContext, DbError};

/// One product line of an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LineItemRecord {
    pub line_item_id: String,
    #[serde(rename = "qty")]
    pub quantity: i64,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub price: String,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    /// Primary image, the first of `images`
    pub image_url: Option<String>,
    pub images: Vec<String>,
    pub reason: Option<String>,
}

#[derive(FromRow)]
struct LineItemRow {
    id: i64,
    line_item_id: String,
    quantity: i64,
    product_title: String,
    variant_title: Option<String>,
    price: String,
    product_id: Option<String>,
    variant_id: Option<String>,
    reason: Option<String>,
}

/// Keyed on `(order_row_id, line_item_id)`. `reason` is a local annotation and is left untouched.
pub async fn upsert_line_item(db: &DbContext, order_row_id: i64, item: &LineItemRecord) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO line_items (
            order_id, line_item_id, quantity, product_title, variant_title, price, product_id, variant_id, reason
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (order_id, line_item_id) DO UPDATE SET
            quantity = excluded.quantity,
            product_title = excluded.product_title,
            variant_title = excluded.variant_title,
            price = excluded.price,
            product_id = excluded.product_id,
            variant_id = excluded.variant_id
        RETURNING id
        "#,
    )
    .bind(order_row_id)
    .bind(&item.line_item_id)
    .bind(item.quantity)
    .bind(&item.product_title)
    .bind(&item.variant_title)
    .bind(&item.price)
    .bind(&item.product_id)
    .bind(&item.variant_id)
    .bind(&item.reason)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// Line items of one order with their stored images attached.
pub async fn list_line_items(db: &DbContext, order_row_id: i64) -> Result<Vec<LineItemRecord>, DbError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
        r#"
        SELECT id, line_item_id, quantity, product_title, variant_title, price, product_id, variant_id, reason
        FROM line_items
        WHERE order_id = ?
        ORDER BY id
        "#,
    )
    .bind(order_row_id)
    .fetch_all(db)
    .await?;

    let image_rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT images.line_item_id, images.image_url
        FROM images
        JOIN line_items ON line_items.id = images.line_item_id
        WHERE line_items.order_id = ?
        ORDER BY images.id
        "#,
    )
    .bind(order_row_id)
    .fetch_all(db)
    .await?;

    let mut images: HashMap<i64, Vec<String>> = HashMap::new();
    for (line_item_row_id, url) in image_rows {
        images.entry(line_item_row_id).or_default().push(url);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let item_images = images.remove(&row.id).unwrap_or_default();
            LineItemRecord {
                line_item_id: row.line_item_id,
                quantity: row.quantity,
                product_title: row.product_title,
                variant_title: row.variant_title,
                price: row.price,
                product_id: row.product_id,
                variant_id: row.variant_id,
                image_url: item_images.first().cloned(),
                images: item_images,
                reason: row.reason,
            }
        })
        .collect())
}
