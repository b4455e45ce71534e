use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Deserialize, Serialize)]
pub struct ShopifySettings {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub api_secret: String,

    /// Public base URL of this backend; the OAuth callback is `{app_url}/auth/callback`
    #[serde(default)]
    pub app_url: String,

    /// Where the browser is sent after the OAuth callback
    #[serde(default)]
    pub frontend_url: String,

    #[serde(default)]
    pub api_version: String,

    /// A list in config files, a comma-separated string in the environment
    #[serde(default, deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,

    /// Replaces `https://{shop}` for every upstream call when set
    #[serde(default)]
    pub api_base_url: String,

    /// Per-request timeout for upstream calls, in seconds; 0 means no timeout
    #[serde(default)]
    pub request_timeout_secs: u64,

    #[serde(default = "default_verify_oauth_state")]
    pub verify_oauth_state: bool,

    #[serde(default = "default_oauth_state_timeout")]
    pub oauth_state_timeout_minutes: u64,
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        List(Vec<String>),
        Joined(String),
    }

    let scopes = match Scopes::deserialize(deserializer)? {
        Scopes::List(scopes) => scopes,
        Scopes::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };
    Ok(scopes
        .into_iter()
        .map(|scope| scope.trim().to_string())
        .filter(|scope| !scope.is_empty())
        .collect())
}

const fn default_verify_oauth_state() -> bool {
    true
}

const fn default_oauth_state_timeout() -> u64 {
    10
}

impl ShopifySettings {
    /// Upstream integration is usable only with both halves of the app credential.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.app_url.trim_end_matches('/'))
    }

    /// Scheme and host for upstream calls on behalf of `shop`.
    #[must_use]
    pub fn base_url_for(&self, shop: &str) -> String {
        if self.api_base_url.is_empty() {
            format!("https://{shop}")
        } else {
            self.api_base_url.trim_end_matches('/').to_string()
        }
    }
}

impl std::fmt::Debug for ShopifySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifySettings")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("app_url", &self.app_url)
            .field("frontend_url", &self.frontend_url)
            .field("api_version", &self.api_version)
            .field("scopes", &self.scopes)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("verify_oauth_state", &self.verify_oauth_state)
            .field("oauth_state_timeout_minutes", &self.oauth_state_timeout_minutes)
            .finish()
    }
}

impl Default for ShopifySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            app_url: "http://localhost:3001".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            api_version: "2023-10".to_string(),
            scopes: vec![
                "read_orders".to_string(),
                "read_products".to_string(),
                "read_customers".to_string(),
            ],
            api_base_url: String::new(),
            request_timeout_secs: 30,
            verify_oauth_state: default_verify_oauth_state(),
            oauth_state_timeout_minutes: default_oauth_state_timeout(),
        }
    }
}
