use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub log_directives: String,

    /// Directory holding the built front-end, served for any unmatched path
    #[serde(default)]
    pub static_dir: String,

    /// Requests per minute per client on the `/auth` endpoints; 0 disables the limit
    #[serde(default = "default_auth_rate_limit")]
    pub auth_rate_limit_per_minute: u32,
}

const fn default_auth_rate_limit() -> u32 {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            log_directives: "info,tower_http=info,axum=info,sqlx=warn".to_string(),
            static_dir: "frontend/dist".to_string(),
            auth_rate_limit_per_minute: default_auth_rate_limit(),
        }
    }
}
