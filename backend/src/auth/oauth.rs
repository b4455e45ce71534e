use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::cfg;
use crate::core::{DbError, ShopDomain, ShopDomainError};

#[rustfmt::skip]
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid shop name: '{0}'")]
    InvalidTenantIdentifier(String),

    #[error("Invalid shop domain format: '{0}'")]
    InvalidTenantDomainFormat(String),

    #[error("OAuth failed: {0}")]
    UpstreamAuthorizationDenied(String),

    #[error("Missing required parameter: {0}")]
    MissingCallbackParameter(&'static str),

    #[error("OAuth state is missing, unknown or issued for another shop")]
    InvalidState,

    #[error("OAuth state expired, please start the connection again")]
    StateExpired,

    #[error("Shopify app credentials are not configured")]
    NotConfigured,

    #[error("Failed to build authorization URL: {0}")]
    InvalidAuthorizationUrl(#[from] url::ParseError),

    #[error("Token exchange failed: {status} - {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<ShopDomainError> for OAuthError {
    fn from(error: ShopDomainError) -> Self {
        match error {
            ShopDomainError::InvalidIdentifier(name) => Self::InvalidTenantIdentifier(name),
            ShopDomainError::InvalidDomainFormat(domain) => Self::InvalidTenantDomainFormat(domain),
        }
    }
}

/// Where to send the merchant, plus the state token that must come back on the callback.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub shop: ShopDomain,
    pub state: String,
}

/// Query string of the OAuth callback. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub shop: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug)]
pub struct ValidatedCallback {
    pub code: String,
    pub shop: ShopDomain,
    pub state: Option<String>,
}

/// Access credential granted for one shop.
pub struct AccessGrant {
    pub shop: ShopDomain,
    pub access_token: String,
    pub scope: Option<String>,
}

impl std::fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGrant")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    scope: Option<String>,
}

impl TokenResponse {
    /// The token and its scope, or `None` when the token is missing or blank.
    fn into_grant_parts(self) -> Option<(String, Option<String>)> {
        let access_token = self.access_token.filter(|token| !token.trim().is_empty())?;
        Some((access_token, self.scope))
    }
}

/// Builds the authorization redirect for loosely formatted shop input. No I/O.
pub fn generate_authorization_url(settings: &cfg::ShopifySettings, raw_shop: &str) -> Result<AuthorizationRequest, OAuthError> {
    let shop = ShopDomain::normalize(raw_shop)?;
    if !settings.is_configured() {
        return Err(OAuthError::NotConfigured);
    }

    let state = oauth2::CsrfToken::new_random().secret().clone();
    let url = Url::parse_with_params(
        &format!("https://{shop}/admin/oauth/authorize"),
        &[
            ("client_id", settings.api_key.as_str()),
            ("scope", settings.scopes.join(",").as_str()),
            ("redirect_uri", settings.callback_url().as_str()),
            ("state", state.as_str()),
        ],
    )?;

    tracing::debug!(raw_shop, shop = %shop, "Generated authorization URL");
    Ok(AuthorizationRequest { url, shop, state })
}

impl CallbackParams {
    /// Checks run before any outbound call: upstream denial, required fields, domain format.
    pub fn validate(&self) -> Result<ValidatedCallback, OAuthError> {
        if let Some(error) = non_empty(self.error.as_deref()) {
            let reason = non_empty(self.error_description.as_deref()).unwrap_or(error);
            return Err(OAuthError::UpstreamAuthorizationDenied(reason.to_string()));
        }
        let code = non_empty(self.code.as_deref()).ok_or(OAuthError::MissingCallbackParameter("code"))?;
        let shop = non_empty(self.shop.as_deref()).ok_or(OAuthError::MissingCallbackParameter("shop"))?;
        let shop = ShopDomain::parse_strict(shop)?;

        Ok(ValidatedCallback {
            code: code.to_string(),
            shop,
            state: self.state.clone(),
        })
    }
}

/// Validates the callback and trades its code for an access credential. Storing it is up to the caller.
pub async fn exchange_code_for_token(
    http: &reqwest::Client,
    settings: &cfg::ShopifySettings,
    params: &CallbackParams,
) -> Result<AccessGrant, OAuthError> {
    let callback = params.validate()?;
    request_access_token(http, settings, &callback).await
}

async fn request_access_token(
    http: &reqwest::Client,
    settings: &cfg::ShopifySettings,
    callback: &ValidatedCallback,
) -> Result<AccessGrant, OAuthError> {
    if !settings.is_configured() {
        return Err(OAuthError::NotConfigured);
    }

    let token_url = format!("{}/admin/oauth/access_token", settings.base_url_for(callback.shop.as_str()));
    tracing::info!(shop = %callback.shop, "Exchanging authorization code for access token");

    let mut request = http.post(&token_url).json(&serde_json::json!({
        "client_id": settings.api_key,
        "client_secret": settings.api_secret,
        "code": callback.code,
    }));
    if settings.request_timeout_secs > 0 {
        request = request.timeout(std::time::Duration::from_secs(settings.request_timeout_secs));
    }
    let response = request.send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::error!(shop = %callback.shop, status = status.as_u16(), "Token exchange rejected");
        return Err(OAuthError::TokenExchangeFailed { status: status.as_u16(), body });
    }

    let token = serde_json::from_str::<TokenResponse>(&body).ok();
    let Some((access_token, scope)) = token.and_then(TokenResponse::into_grant_parts) else {
        return Err(OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            body: "No access token received from Shopify".to_string(),
        });
    };

    tracing::info!(shop = %callback.shop, "Obtained access token");
    Ok(AccessGrant {
        shop: callback.shop.clone(),
        access_token,
        scope,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
