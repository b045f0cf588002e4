use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use hopekcc_common::StorageConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Close pooled connections idle for longer than this. Unset keeps them open.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    /// Recycle pooled connections older than this. Unset keeps them open.
    #[serde(default)]
    pub max_lifetime_secs: Option<u64>,
}

fn default_max_connections() -> u32 {
    100
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout_secs() -> u64 {
    8
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim, if any.
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:5173"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://hopekcc.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., HOPEKCC__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("HOPEKCC")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
