use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::core::{DbContext, DbError, ShopDomain};

/// Stored access credential of one connected shop.
#[derive(Clone, FromRow)]
pub struct ShopCredential {
    pub id: i64,
    pub shop_domain: String,
    pub access_token: String,
    pub scope: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ShopCredential {
    /// Time of the most recent successful authentication.
    #[must_use]
    pub const fn connected_at(&self) -> NaiveDateTime {
        self.updated_at
    }
}

impl std::fmt::Debug for ShopCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredential")
            .field("id", &self.id)
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct ShopSummary {
    pub shop_domain: String,
    pub scope: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Re-authentication overwrites the existing credential, it never adds a second row.
pub async fn upsert_credential(
    db: &DbContext,
    shop: &ShopDomain,
    access_token: &str,
    scope: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO shops (shop_domain, access_token, scope, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT (shop_domain) DO UPDATE SET
            access_token = excluded.access_token,
            scope = excluded.scope,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(shop.as_str())
    .bind(access_token)
    .bind(scope)
    .execute(db)
    .await?;
    Ok(())
}

/// `None` simply means the shop has not been connected yet.
pub async fn get_credential(db: &DbContext, shop: &ShopDomain) -> Result<Option<ShopCredential>, DbError> {
    let credential = sqlx::query_as::<_, ShopCredential>(
        r#"
        SELECT id, shop_domain, access_token, scope, created_at, updated_at
        FROM shops
        WHERE shop_domain = ?
        "#,
    )
    .bind(shop.as_str())
    .fetch_optional(db)
    .await?;
    Ok(credential)
}

pub async fn list_shops(db: &DbContext) -> Result<Vec<ShopSummary>, DbError> {
    let shops = sqlx::query_as::<_, ShopSummary>(
        r#"
        SELECT shop_domain, scope, created_at, updated_at
        FROM shops
        ORDER BY shop_domain
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(shops)
}
