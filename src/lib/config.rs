use std::env;

use anyhow::Context;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub log_filter: String,
    /// Keep todos in process memory instead of the database.
    pub in_memory: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            in_memory: false,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads `TODO_PORT`, `DATABASE_URL`,
    /// `RUST_LOG` and `TODO_IN_MEMORY`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let port = match lookup("TODO_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("TODO_PORT must be a port number, got {raw:?}"))?,
            None => defaults.port,
        };
        let in_memory = lookup("TODO_IN_MEMORY")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.in_memory);
        Ok(Self {
            port,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
            in_memory,
        })
    }
}
