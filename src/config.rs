use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub state_ttl: Duration,
    pub sweep_period: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Reads the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        Ok(Config {
            database: DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
                busy_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DATABASE_BUSY_TIMEOUT_SECS",
                    5,
                )?),
            },
            auth: AuthConfig {
                state_ttl: Duration::from_secs(parse_or(&lookup, "AUTH_STATE_TTL_SECS", 3600)?),
                sweep_period: Duration::from_secs(parse_or(
                    &lookup,
                    "AUTH_STATE_SWEEP_SECS",
                    300,
                )?),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}
