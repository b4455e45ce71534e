//! Deterministic placeholder data for shops without a live connection or a cache.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};

use crate::core::ShopDomain;
use crate::db::{LineItemRecord, OrderDetail, OrderRecord};

pub const DEMO_ORDER_COUNT: u32 = 15;
const FIRST_DEMO_ORDER_NUMBER: u32 = 1001;

const LIST_STATUSES: [&str; 4] = ["paid", "pending", "refunded", "cancelled"];
const DETAIL_STATUSES: [&str; 3] = ["paid", "pending", "refunded"];
const CUSTOMERS: [&str; 5] = ["customer", "john", "sarah", "mike", "admin"];

/// Same seed parts, same generator, on every call.
fn seeded_rng(parts: &[&str]) -> StdRng {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    StdRng::from_seed(seed)
}

fn start_of_day() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn price_from_cents(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn demo_order(shop: &ShopDomain, order_id: String, status: &str, total_cents: u32, customer: &str, created_at: DateTime<Utc>) -> OrderRecord {
    OrderRecord {
        shop: shop.as_str().to_string(),
        name: format!("#{order_id}"),
        order_id,
        status: status.to_string(),
        total_price: price_from_cents(total_cents),
        currency: Some("USD".to_string()),
        customer_email: Some(format!("{customer}@{}.com", shop.name())),
        customer_name: Some(capitalize(customer)),
        fulfillment_status: Some("unfulfilled".to_string()),
        created_at,
        updated_at: None,
        order_data: "{}".to_string(),
    }
}

/// Fifteen orders dated within the last 30 days, totals in `[50, 550)`.
#[must_use]
pub fn generate_demo_orders(shop: &ShopDomain) -> Vec<OrderRecord> {
    let mut rng = seeded_rng(&[shop.as_str()]);
    let anchor = start_of_day();

    let mut orders: Vec<OrderRecord> = (0..DEMO_ORDER_COUNT)
        .map(|i| {
            let status = LIST_STATUSES[rng.random_range(0..LIST_STATUSES.len())];
            let total_cents = rng.random_range(5_000..55_000);
            let customer = CUSTOMERS[rng.random_range(0..CUSTOMERS.len())];
            let age = Duration::seconds(rng.random_range(0..30 * 24 * 60 * 60));
            demo_order(shop, (FIRST_DEMO_ORDER_NUMBER + i).to_string(), status, total_cents, customer, anchor - age)
        })
        .collect();

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

/// One order with a single line item, seeded by shop and order id.
#[must_use]
pub fn generate_demo_order(shop: &ShopDomain, order_id: &str) -> OrderDetail {
    let mut rng = seeded_rng(&[shop.as_str(), order_id]);

    let status = DETAIL_STATUSES[rng.random_range(0..DETAIL_STATUSES.len())];
    let total_cents = rng.random_range(5_000..55_000);
    let age = Duration::seconds(rng.random_range(0..7 * 24 * 60 * 60));
    let order = demo_order(shop, order_id.to_string(), status, total_cents, CUSTOMERS[0], start_of_day() - age);

    let line_item = LineItemRecord {
        line_item_id: rng.random_range(1..10_000u32).to_string(),
        quantity: rng.random_range(1..=3),
        product_title: format!("{} Product", capitalize(shop.name())),
        variant_title: Some("Default Variant".to_string()),
        price: price_from_cents(rng.random_range(2_500..22_500)),
        ..Default::default()
    };

    OrderDetail {
        order,
        line_items: vec![line_item],
        shipping_address: None,
        billing_address: None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use super::*;

    fn acme() -> ShopDomain {
        ShopDomain::normalize("acme").unwrap()
    }

    #[test]
    fn demo_list_has_fifteen_plausible_orders() {
        let orders = generate_demo_orders(&acme());
        assert_eq!(orders.len(), 15);

        let low = Decimal::from(50);
        let high = Decimal::from(550);
        for order in &orders {
            assert!(LIST_STATUSES.contains(&order.status.as_str()), "status {}", order.status);
            let price = Decimal::from_str(&order.total_price).unwrap();
            assert!(price >= low && price < high, "price {price}");
            assert!(order.customer_email.as_deref().unwrap().ends_with("@acme.com"));
            assert_eq!(order.shop, "acme.myshopify.com");
        }

        let mut ids: Vec<_> = orders.iter().map(|o| o.order_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn demo_list_is_stable_across_calls() {
        assert_eq!(generate_demo_orders(&acme()), generate_demo_orders(&acme()));
    }

    #[test]
    fn demo_detail_is_seeded_by_order_id() {
        let first = generate_demo_order(&acme(), "1001");
        assert_eq!(first, generate_demo_order(&acme(), "1001"));
        assert_eq!(first.order.order_id, "1001");
        assert!(DETAIL_STATUSES.contains(&first.order.status.as_str()));

        let item = &first.line_items[0];
        assert_eq!(item.product_title, "Acme Product");
        assert!((1..=3).contains(&item.quantity));
        let price = Decimal::from_str(&item.price).unwrap();
        assert!(price >= Decimal::from(25) && price < Decimal::from(225));
    }

    #[test]
    fn prices_keep_two_decimals() {
        assert_eq!(price_from_cents(5_005), "50.05");
        assert_eq!(price_from_cents(54_999), "549.99");
    }
}
