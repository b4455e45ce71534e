use chrono::{TimeZone, Utc};

use super::support::*;
use crate::core::{DbContext, ShopDomain};
use crate::db::{self, LineItemRecord, OrderRecord};
use crate::shopify::MailingAddress;
use crate::services::sync::{self, ReconcileSummary, SyncError};

fn order(shop: &ShopDomain, order_id: &str, status: &str, total_price: &str) -> OrderRecord {
    OrderRecord {
        shop: shop.to_string(),
        order_id: order_id.to_string(),
        name: format!("#{order_id}"),
        status: status.to_string(),
        total_price: total_price.to_string(),
        currency: Some("USD".to_string()),
        customer_email: Some("jane@example.com".to_string()),
        customer_name: Some("Jane Doe".to_string()),
        fulfillment_status: Some("unfulfilled".to_string()),
        created_at: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
        updated_at: None,
        order_data: "{}".to_string(),
    }
}

fn line_item(line_item_id: &str, quantity: i64, images: &[&str]) -> LineItemRecord {
    LineItemRecord {
        line_item_id: line_item_id.to_string(),
        quantity,
        product_title: "Cotton Tee".to_string(),
        variant_title: Some("Large".to_string()),
        price: "60.00".to_string(),
        product_id: Some("5001".to_string()),
        images: images.iter().map(ToString::to_string).collect(),
        image_url: images.first().map(ToString::to_string),
        ..Default::default()
    }
}

async fn count(db: &DbContext, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    let orders = vec![order(&acme, "1001", "paid", "10.00"), order(&acme, "1002", "pending", "20.00")];

    let first = sync::reconcile(&context.db, &acme, &orders).await;
    let second = sync::reconcile(&context.db, &acme, &orders).await;

    assert_eq!(first, ReconcileSummary { attempted: 2, failed: 0 });
    assert_eq!(second, first);
    assert_eq!(count(&context.db, "orders").await, 2);

    let (_, stored) = db::get_order(&context.db, &acme, "1001").await.unwrap().unwrap();
    assert_eq!(stored, orders[0]);
}

#[tokio::test]
async fn test_reconcile_updates_status_in_place() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");

    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "pending", "10.00")]).await;
    let (row_id, _) = db::get_order(&context.db, &acme, "1001").await.unwrap().unwrap();

    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "12.50")]).await;
    let (updated_row_id, stored) = db::get_order(&context.db, &acme, "1001").await.unwrap().unwrap();

    assert_eq!(updated_row_id, row_id);
    assert_eq!(stored.status, "paid");
    assert_eq!(stored.total_price, "12.50");
    assert_eq!(count(&context.db, "orders").await, 1);
}

#[tokio::test]
async fn test_same_order_id_in_two_shops_is_two_rows() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    let other = shop("other");

    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "10.00")]).await;
    sync::reconcile(&context.db, &other, &[order(&other, "1001", "refunded", "10.00")]).await;

    assert_eq!(count(&context.db, "orders").await, 2);
    let (_, stored) = db::get_order(&context.db, &acme, "1001").await.unwrap().unwrap();
    assert_eq!(stored.status, "paid");
}

#[tokio::test]
async fn test_bad_record_does_not_abort_batch() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    let other = shop("other");
    let orders = vec![
        order(&acme, "1001", "paid", "10.00"),
        order(&other, "2001", "paid", "10.00"),
        order(&acme, "1003", "paid", "30.00"),
    ];

    let summary = sync::reconcile(&context.db, &acme, &orders).await;

    assert_eq!(summary, ReconcileSummary { attempted: 3, failed: 1 });
    assert_eq!(summary.stored(), 2);
    assert_eq!(db::list_orders(&context.db, &acme).await.unwrap().len(), 2);
    assert!(db::list_orders(&context.db, &other).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_line_item_quantity_updates_in_place() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "60.00")]).await;

    sync::reconcile_order_detail(&context.db, &acme, "1001", &[line_item("9001", 1, &[])])
        .await
        .unwrap();
    sync::reconcile_order_detail(&context.db, &acme, "1001", &[line_item("9001", 4, &[])])
        .await
        .unwrap();

    let row_id = db::get_order_row_id(&context.db, &acme, "1001").await.unwrap().unwrap();
    let items = db::list_line_items(&context.db, row_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 4);
    assert_eq!(count(&context.db, "line_items").await, 1);
}

#[tokio::test]
async fn test_line_items_need_their_order_first() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");

    let err = sync::reconcile_order_detail(&context.db, &acme, "404", &[line_item("9001", 1, &[])])
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::OrderNotReconciled(ref id) if id == "404"));
    assert_eq!(count(&context.db, "line_items").await, 0);
}

#[tokio::test]
async fn test_duplicate_images_are_skipped() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "60.00")]).await;
    let item = line_item("9001", 1, &["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"]);

    sync::reconcile_order_detail(&context.db, &acme, "1001", std::slice::from_ref(&item))
        .await
        .unwrap();
    sync::reconcile_order_detail(&context.db, &acme, "1001", std::slice::from_ref(&item))
        .await
        .unwrap();
    assert_eq!(count(&context.db, "images").await, 2);

    let row_id = db::get_order_row_id(&context.db, &acme, "1001").await.unwrap().unwrap();
    let items = db::list_line_items(&context.db, row_id).await.unwrap();
    assert_eq!(items[0].images, item.images);
    assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/a.png"));
}

#[tokio::test]
async fn test_images_are_capped_per_line_item() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "60.00")]).await;
    let urls = ["https://cdn.example.com/1.png", "https://cdn.example.com/2.png", "https://cdn.example.com/3.png", "https://cdn.example.com/4.png"];

    sync::reconcile_order_detail(&context.db, &acme, "1001", &[line_item("9001", 1, &urls)])
        .await
        .unwrap();

    assert_eq!(count(&context.db, "images").await, 3);
}

#[tokio::test]
async fn test_image_insert_conflict_is_a_no_op() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "60.00")]).await;
    let order_row_id = db::get_order_row_id(&context.db, &acme, "1001").await.unwrap().unwrap();
    let line_item_row_id = db::upsert_line_item(&context.db, order_row_id, &line_item("9001", 1, &[]))
        .await
        .unwrap();

    assert!(db::insert_image(&context.db, "https://cdn.example.com/a.png", Some(line_item_row_id)).await.unwrap());
    assert!(!db::insert_image(&context.db, "https://cdn.example.com/a.png", Some(line_item_row_id)).await.unwrap());
    assert_eq!(count(&context.db, "images").await, 1);
}

#[tokio::test]
async fn test_list_sync_keeps_stored_addresses() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "pending", "60.00")]).await;
    let shipping = MailingAddress {
        first_name: Some("Jane".to_string()),
        city: Some("Lisbon".to_string()),
        country: Some("Portugal".to_string()),
        ..Default::default()
    };

    assert!(db::update_order_addresses(&context.db, &acme, "1001", Some(&shipping), None).await.unwrap());
    // a list sync rewrites order_data without any address in it
    sync::reconcile(&context.db, &acme, &[order(&acme, "1001", "paid", "60.00")]).await;

    let (row_id, stored) = db::get_order(&context.db, &acme, "1001").await.unwrap().unwrap();
    assert_eq!(stored.status, "paid");
    assert_eq!(stored.order_data, "{}");
    let (stored_shipping, stored_billing) = db::get_order_addresses(&context.db, row_id).await.unwrap();
    assert_eq!(stored_shipping, Some(shipping));
    assert_eq!(stored_billing, None);
}

#[tokio::test]
async fn test_addresses_of_unknown_order_are_not_stored() {
    let context = create_context(demo_settings()).await;
    let acme = shop("acme");

    assert!(!db::update_order_addresses(&context.db, &acme, "404", None, None).await.unwrap());
    assert_eq!(count(&context.db, "orders").await, 0);
}
