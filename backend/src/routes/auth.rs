use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use crate::auth::{self, CallbackParams, OAuthError};
use crate::core::{self, ShopDomain};
use crate::db;
use crate::routes::orders::ShopQuery;
use crate::services::orders;

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        tracing::error!(
            error_type = %std::any::type_name::<Self>(),
            error_message = %self);

        let status = match self {
            Self::InvalidTenantIdentifier(_)
            | Self::InvalidTenantDomainFormat(_)
            | Self::MissingCallbackParameter(_)
            | Self::UpstreamAuthorizationDenied(_)
            | Self::InvalidState
            | Self::StateExpired
            | Self::NotConfigured => StatusCode::BAD_REQUEST,
            Self::TokenExchangeFailed { .. } | Self::HttpRequestFailed(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidAuthorizationUrl(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "result": "error",
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// `GET /auth?shop=`: redirect the merchant to the upstream consent screen.
pub async fn begin_auth(
    State(context): State<core::ArcContext>,
    Query(query): Query<ShopQuery>,
) -> Result<Redirect, OAuthError> {
    let settings = &context.settings.shopify;
    let request = auth::generate_authorization_url(settings, query.shop.as_deref().unwrap_or_default())?;
    context
        .oauth_states
        .remember(&request.state, &request.shop, auth::state_timeout(settings.oauth_state_timeout_minutes))
        .await;

    tracing::info!(shop = %request.shop, "Redirecting to Shopify authorization");
    Ok(Redirect::to(request.url.as_str()))
}

/// `GET /auth/callback`: always lands the browser back on the front-end, with `shop` or `error`.
pub async fn auth_callback(State(context): State<core::ArcContext>, Query(params): Query<CallbackParams>) -> Redirect {
    match complete_authorization(&context, &params).await {
        Ok(shop) => Redirect::to(&frontend_redirect(&context, "shop", shop.name())),
        Err(e) => {
            tracing::error!("OAuth callback failed: {}", e);
            Redirect::to(&frontend_redirect(&context, "error", &e.to_string()))
        }
    }
}

async fn complete_authorization(context: &core::Context, params: &CallbackParams) -> Result<ShopDomain, OAuthError> {
    let settings = &context.settings.shopify;
    let callback = params.validate()?;
    if settings.verify_oauth_state {
        context
            .oauth_states
            .consume(callback.state.as_deref(), &callback.shop, auth::state_timeout(settings.oauth_state_timeout_minutes))
            .await?;
    }

    let grant = auth::exchange_code_for_token(&context.http_client, settings, params).await?;
    db::upsert_credential(&context.db, &grant.shop, &grant.access_token, grant.scope.as_deref()).await?;
    tracing::info!(shop = %grant.shop, "Stored access token");

    match orders::manual_sync(context, &grant.shop).await {
        Ok(outcome) => tracing::info!(shop = %grant.shop, count = outcome.count, "Initial sync finished"),
        Err(e) => tracing::warn!(shop = %grant.shop, "Initial sync failed: {}", e),
    }

    Ok(grant.shop)
}

fn frontend_redirect(context: &core::Context, key: &str, value: &str) -> String {
    let frontend_url = &context.settings.shopify.frontend_url;
    url::Url::parse_with_params(frontend_url, &[(key, value)]).map_or_else(
        |e| {
            tracing::warn!(frontend_url, "Invalid frontend URL: {}", e);
            "/".to_string()
        },
        String::from,
    )
}
