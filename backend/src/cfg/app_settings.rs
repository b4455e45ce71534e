use std::{env, fs, path::Path};

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::cfg;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AppSettings {
    #[serde(default)]
    pub server: cfg::ServerSettings,

    #[serde(default)]
    pub database: cfg::DatabaseSettings,

    #[serde(default)]
    pub shopify: cfg::ShopifySettings,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let app_run_env = Self::get_app_run_env();
        let config_path = Self::get_config_path();

        // Layer 0: defaults from AppSettings::default()
        let mut builder = Self::defaults_builder()?;

        // Layer 1: shared configuration file
        let default_config_path = config_path.join("configs.default.toml");
        if default_config_path.exists() {
            builder = builder.add_source(File::from(default_config_path));
        }

        // Layer 2: environment-specific file
        let env_config_path = config_path.join(format!("configs.{app_run_env}.toml"));
        let env_config_exists = env_config_path.exists();
        if env_config_exists {
            builder = builder.add_source(File::from(env_config_path.clone()));
        }

        // Layer 3: local overrides, never committed
        let local_config_path = config_path.join("configs.local.toml");
        if local_config_path.exists() {
            builder = builder.add_source(File::from(local_config_path));
        }

        // Layer 4: environment variables, e.g. APP_SHOPIFY__API_KEY, APP_DATABASE__URL.
        builder = builder.add_source(Self::environment_source());

        let settings = builder.build()?.try_deserialize::<Self>()?;

        // In production, write out the effective config so operators have a file to edit.
        if app_run_env == "production" && !env_config_exists {
            settings.write_config_file(&env_config_path)?;
            // the subscriber is installed from these settings, so nothing is listening yet
            println!("Created default config file at {}", env_config_path.to_string_lossy());
        }

        Ok(settings)
    }

    /// Writes the redacted settings as TOML.
    fn write_config_file(&self, path: &Path) -> Result<(), ConfigError> {
        let settings_str = toml::to_string(&self.redacted())
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;
        fs::write(path, settings_str).map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_toml = toml::to_string(&Self::default())
            .map_err(|e| ConfigError::Message(format!("Failed to serialize defaults: {e}")))?;
        Ok(config::Config::builder().add_source(File::from_str(&default_toml, FileFormat::Toml)))
    }

    /// Field names contain underscores, so nesting uses a double underscore.
    /// Values stay strings: typed fields convert on deserialize, secrets keep leading zeros.
    fn environment_source() -> Environment {
        Environment::with_prefix("APP").prefix_separator("_").separator("__")
    }

    #[must_use]
    pub fn get_server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn get_app_run_env() -> String {
        env::var("APP_RUN_ENV").unwrap_or_else(|_| "production".to_string())
    }

    #[must_use]
    pub fn get_config_path() -> &'static Path {
        Path::new(".")
    }

    #[must_use]
    pub fn get_config_full_path() -> String {
        let config_path = Self::get_config_path();
        config_path
            .canonicalize()
            .ok()
            .unwrap_or_else(|| config_path.to_path_buf())
            .to_string_lossy()
            .to_string()
    }

    /// Copy of the settings safe to write to disk: the API secret is left out.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        settings.shopify.api_secret = String::new();
        settings
    }
}
