//! Handles settings for the application.
//!
//! Settings are read from an optional `settings.toml` in the working
//! directory, then overridden by `WALLET__<SECTION>__<KEY>` environment
//! variables (e.g. `WALLET__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of the SQLite file, created if missing.
    Sqlite(String),
    /// Full `postgres://` connection URL.
    Postgres(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub request_timeout_ms: u64,
    /// Defaults to the `wallet.db` SQLite file.
    pub database: Option<Database>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_ms", 5000)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("WALLET").separator("__"))
            .build()?
            .try_deserialize()
    }
}
