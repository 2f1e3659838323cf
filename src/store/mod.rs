//! SQLite persistence for matches, their rosters and the player directory.
//!
//! Single statements take any `SqliteExecutor` (the pool, a connection or a
//! transaction). Functions that must share a caller's transaction take a
//! `&mut SqliteConnection` instead.

use std::str::FromStr;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::config::DatabaseConfig;
use crate::error::{DbError, Result};

pub mod matches;
pub mod players;
pub mod roster;

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    info!(
        "Connected to {} with up to {} connections",
        config.url, config.max_connections
    );
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

// Timestamps are stored as nanoseconds since the epoch, which fits an i64 until 2262.
pub(crate) fn to_unix_nanos(timestamp: OffsetDateTime) -> Result<i64> {
    i64::try_from(timestamp.unix_timestamp_nanos())
        .map_err(|_| DbError::Conversion(format!("timestamp {timestamp} is out of range")))
}

pub(crate) fn from_unix_nanos(nanos: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|err| DbError::Conversion(err.to_string()))
}
