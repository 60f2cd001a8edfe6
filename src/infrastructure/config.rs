//! Application configuration

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP and WebSocket server port
    pub server_port: u16,
    /// SQLite URL for finished-scenario results; results stay in memory when unset
    pub database_url: Option<String>,
    /// JSON bundle of cards and scenarios; the built-in set is used when unset
    pub content_path: Option<String>,
    /// Fixed seed for every new room, for reproducible sessions
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_url: None,
            content_path: None,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            database_url: non_empty("DATABASE_URL"),
            content_path: non_empty("CONTENT_PATH"),
            rng_seed: non_empty("RNG_SEED")
                .map(|seed| seed.parse())
                .transpose()
                .context("RNG_SEED must be an unsigned integer")?,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
