use thiserror::Error;

/// Failures talking to the upstream commerce API, typed so callers can switch on the kind.
#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("Network error talking to Shopify: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized: the stored access token was rejected")]
    Unauthorized,

    #[error("Shop not found or access denied: {0}")]
    ShopNotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("GraphQL errors: {}", .0.join("; "))]
    QueryFailed(Vec<String>),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to decode Shopify response: {0}")]
    Decode(#[from] serde_json::Error),
}
