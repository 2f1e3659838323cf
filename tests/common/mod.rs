#![allow(dead_code)]

use std::str::FromStr;

use matchbot_store::{store, Match, MatchService, Player};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const EPOCH: OffsetDateTime = datetime!(2023-03-01 18:00 UTC);

// A private in-memory database lives as long as its only connection.
pub async fn pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    store::migrate(&pool).await.unwrap();
    pool
}

pub async fn service() -> MatchService {
    MatchService::new(pool().await)
}

pub async fn players(pool: &SqlitePool, ids: &[&str]) -> Vec<Player> {
    let mut players = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let mut player = Player::new(*id);
        player.elo = 1000 + 25 * i as i64;
        player.credits = i as i64;
        player.save(pool).await.unwrap();
        players.push(player);
    }
    players
}

/// A running match created `minutes` after [`EPOCH`].
pub fn match_at(minutes: i64, team1: Vec<Player>, team2: Vec<Player>) -> Match {
    let mut m = Match::new(
        format!("thread-{minutes}"),
        format!("message-{minutes}"),
        team1,
        team2,
    );
    m.created_at = EPOCH + Duration::minutes(minutes);
    m
}

pub fn ids(players: &[Player]) -> Vec<String> {
    let mut ids: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    ids
}

pub async fn roster_rows(pool: &SqlitePool, match_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM match_players WHERE match_id = ?")
        .bind(match_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn match_rows(pool: &SqlitePool, match_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
