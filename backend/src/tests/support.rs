use axum_test::TestServer;
use serde_json::{Value, json};

use crate::app;
use crate::cfg;
use crate::core;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";
pub const ACCESS_TOKEN: &str = "shpat_test_token";

/// Nothing configured upstream: every read ends in cache or demo data.
pub fn demo_settings() -> cfg::AppSettings {
    let mut settings = cfg::AppSettings::default();
    // one connection, or each one gets its own empty in-memory database
    settings.database = cfg::DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        run_migrations_on_startup: true,
    };
    settings.server.auth_rate_limit_per_minute = 0;
    settings
}

/// App credentials present, every upstream call sent to `api_base_url`.
pub fn configured_settings(api_base_url: &str) -> cfg::AppSettings {
    let mut settings = demo_settings();
    settings.shopify.api_key = API_KEY.to_string();
    settings.shopify.api_secret = API_SECRET.to_string();
    settings.shopify.api_base_url = api_base_url.to_string();
    settings.shopify.request_timeout_secs = 5;
    settings
}

pub async fn create_context(settings: cfg::AppSettings) -> core::ArcContext {
    let db = core::create_db_context(&settings.database).await.unwrap();
    app::run_migrations(&db).await.unwrap();
    let http_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    core::Context::new(db, http_client, settings)
}

pub fn create_test_server(context: &core::ArcContext) -> TestServer {
    TestServer::new(app::create_router(context.clone())).unwrap()
}

pub fn shop(name: &str) -> core::ShopDomain {
    core::ShopDomain::normalize(name).unwrap()
}

/// One upstream order node in Admin GraphQL shape.
pub fn order_node(legacy_id: u64, financial_status: &str, amount: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Order/{legacy_id}"),
        "name": format!("#{legacy_id}"),
        "createdAt": "2025-05-01T10:00:00Z",
        "updatedAt": "2025-05-02T10:00:00Z",
        "totalPriceSet": { "shopMoney": { "amount": amount, "currencyCode": "USD" } },
        "displayFinancialStatus": financial_status,
        "displayFulfillmentStatus": "UNFULFILLED",
        "customer": { "email": "jane@example.com", "firstName": "Jane", "lastName": "Doe" }
    })
}

pub fn orders_response(nodes: Vec<Value>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({ "node": node })).collect();
    json!({
        "data": {
            "orders": {
                "edges": edges,
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }
        }
    })
}

/// Detail of one order with a single line item whose product has a featured image.
pub fn order_detail_response(legacy_id: u64, quantity: i64) -> Value {
    let mut node = order_node(legacy_id, "PAID", "120.00");
    node["lineItems"] = json!({
        "edges": [{
            "node": {
                "id": "gid://shopify/LineItem/9001",
                "title": "Cotton Tee",
                "quantity": quantity,
                "variant": {
                    "id": "gid://shopify/ProductVariant/7001",
                    "title": "Large",
                    "price": "60",
                    "product": {
                        "id": "gid://shopify/Product/5001",
                        "title": "Cotton Tee",
                        "featuredImage": { "url": "https://cdn.example.com/tee-front.png" }
                    }
                }
            }
        }]
    });
    node["shippingAddress"] = json!({ "firstName": "Jane", "city": "Lisbon", "country": "Portugal" });
    json!({ "data": { "order": node } })
}
