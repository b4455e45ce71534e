//! Typed mirror of the upstream responses. Payloads are validated here and turned into
//! [`OrderRecord`]/[`LineItemRecord`] right away; nothing downstream touches raw JSON.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::core::ShopDomain;
use crate::db::{LineItemRecord, OrderRecord};

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct OrdersData {
    pub orders: Connection<OrderNode>,
}

#[derive(Debug, Deserialize)]
pub struct OrderData {
    pub order: Option<OrderNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Edge<T> {
    pub node: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNode {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub total_price_set: MoneyBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_price_set: Option<MoneyBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tax_set: Option<MoneyBag>,
    #[serde(default)]
    pub display_financial_status: Option<FinancialStatus>,
    #[serde(default)]
    pub display_fulfillment_status: Option<FulfillmentStatus>,
    #[serde(default)]
    pub customer: Option<CustomerNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Connection<LineItemNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<MailingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<MailingAddress>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBag {
    pub shop_money: Money,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LineItemNode {
    pub id: String,
    pub title: String,
    pub quantity: i64,
    #[serde(default)]
    pub variant: Option<VariantNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VariantNode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub product: Option<ProductNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub featured_image: Option<ImageNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ImageNode {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingAddress {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// REST `products/{id}/images.json` body.
#[derive(Debug, Deserialize)]
pub struct ProductImages {
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Deserialize)]
pub struct ProductImage {
    pub src: String,
}

/// Upstream enum with a lower-case local spelling; unknown values survive as `Other`.
macro_rules! upstream_enum {
    ($name:ident { $($variant:ident => $upstream:literal),+ $(,)? }) => {
        #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($upstream => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $upstream.to_string(),)+
                    $name::Other(other) => other,
                }
            }
        }

        impl $name {
            #[must_use]
            pub fn to_local(&self) -> String {
                String::from(self.clone()).to_lowercase()
            }
        }
    };
}

upstream_enum!(FinancialStatus {
    Authorized => "AUTHORIZED",
    Expired => "EXPIRED",
    Paid => "PAID",
    PartiallyPaid => "PARTIALLY_PAID",
    PartiallyRefunded => "PARTIALLY_REFUNDED",
    Pending => "PENDING",
    Refunded => "REFUNDED",
    Voided => "VOIDED",
});

upstream_enum!(FulfillmentStatus {
    Fulfilled => "FULFILLED",
    InProgress => "IN_PROGRESS",
    OnHold => "ON_HOLD",
    Open => "OPEN",
    PartiallyFulfilled => "PARTIALLY_FULFILLED",
    PendingFulfillment => "PENDING_FULFILLMENT",
    Restocked => "RESTOCKED",
    Scheduled => "SCHEDULED",
    Unfulfilled => "UNFULFILLED",
});

/// `gid://shopify/Order/5551234` → `5551234`.
#[must_use]
pub fn legacy_id(gid: &str) -> &str {
    gid.rsplit('/').next().unwrap_or(gid)
}

/// Decimal amount as a two-decimal fixed-point string; missing or garbage becomes `0.00`.
#[must_use]
pub fn coerce_price(amount: Option<&str>) -> String {
    let Some(amount) = amount else {
        return "0.00".to_string();
    };
    match Decimal::from_str(amount.trim()) {
        // half a cent rounds up, as a till does
        Ok(value) => format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        Err(e) => {
            tracing::warn!(amount, error = %e, "Unparseable price from Shopify, using 0.00");
            "0.00".to_string()
        }
    }
}

impl OrderNode {
    pub fn into_record(self, shop: &ShopDomain) -> Result<OrderRecord, serde_json::Error> {
        let order_data = serde_json::to_string(&self)?;
        let customer_name = self.customer.as_ref().and_then(CustomerNode::full_name);
        Ok(OrderRecord {
            shop: shop.to_string(),
            order_id: legacy_id(&self.id).to_string(),
            name: self.name,
            status: self
                .display_financial_status
                .map_or_else(|| "pending".to_string(), |s| s.to_local()),
            total_price: coerce_price(Some(&self.total_price_set.shop_money.amount)),
            currency: Some(self.total_price_set.shop_money.currency_code),
            customer_email: self.customer.and_then(|c| c.email),
            customer_name,
            fulfillment_status: Some(
                self.display_fulfillment_status
                    .map_or_else(|| "unfulfilled".to_string(), |s| s.to_local()),
            ),
            created_at: self.created_at,
            updated_at: self.updated_at,
            order_data,
        })
    }
}

impl CustomerNode {
    fn full_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl LineItemNode {
    #[must_use]
    pub fn into_record(self) -> LineItemRecord {
        let variant = self.variant;
        let product = variant.as_ref().and_then(|v| v.product.as_ref());
        let images: Vec<String> = product
            .and_then(|p| p.featured_image.as_ref())
            .map(|image| image.url.clone())
            .into_iter()
            .collect();

        LineItemRecord {
            line_item_id: legacy_id(&self.id).to_string(),
            quantity: self.quantity,
            product_title: product.and_then(|p| p.title.clone()).unwrap_or(self.title),
            variant_title: variant.as_ref().and_then(|v| v.title.clone()),
            price: coerce_price(variant.as_ref().and_then(|v| v.price.as_deref())),
            product_id: product.map(|p| legacy_id(&p.id).to_string()),
            variant_id: variant.as_ref().map(|v| legacy_id(&v.id).to_string()),
            image_url: images.first().cloned(),
            images,
            reason: None,
        }
    }
}
