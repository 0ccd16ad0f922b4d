use common::PlanPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Take the visitor address from `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Insert the demo user, sites, and reviews on startup.
    #[serde(default)]
    pub seed_demo: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,
}

fn default_access_ttl() -> i64 {
    15
}

fn default_refresh_ttl() -> i64 {
    7
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    /// Absolute base URL used in embed snippets, e.g. `https://reviews.example.com`.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub widget: WidgetConfig,
    #[serde(default)]
    pub plans: PlanPolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.trust_proxy_headers", false)?
            .set_default("auth.access_token_ttl_minutes", default_access_ttl())?
            .set_default("auth.refresh_token_ttl_days", default_refresh_ttl())?
            .set_default("widget.public_base_url", "http://127.0.0.1:3000")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., REVIEWS__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("REVIEWS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
