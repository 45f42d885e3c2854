//! Handles settings for the application. Configuration is read from an optional
//! `settings.toml` and from `FINTRACK__*` environment variables
//! (`FINTRACK__SERVER__PORT=8080`).
//!
//! See `settings.example.toml` for the layout.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Install the default category catalog at startup.
    #[serde(default = "default_seed")]
    pub seed_categories: bool,
}

fn default_seed() -> bool {
    true
}

/// One accepted bearer token and the identity it stands for.
#[derive(Debug, Deserialize)]
pub struct Token {
    pub token: String,
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Auth {
    #[serde(default)]
    pub tokens: Vec<Token>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("FINTRACK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
