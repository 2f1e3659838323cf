use log::info;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use crate::error::{DbError, Result};
use crate::models::Player;
use crate::store::{from_unix_nanos, to_unix_nanos};

#[derive(Debug, FromRow)]
pub(crate) struct PlayerRow {
    pub id: String,
    pub elo: i64,
    pub linked_account: Option<String>,
    pub last_rank_update: Option<i64>,
    pub credits: i64,
}

impl TryFrom<PlayerRow> for Player {
    type Error = DbError;

    fn try_from(row: PlayerRow) -> Result<Player> {
        Ok(Player {
            id: row.id,
            elo: row.elo,
            linked_account: row.linked_account,
            last_rank_update: row.last_rank_update.map(from_unix_nanos).transpose()?,
            credits: row.credits,
        })
    }
}

impl Player {
    pub async fn get(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Player> {
        sqlx::query_as::<_, PlayerRow>(
            "SELECT id, elo, linked_account, last_rank_update, credits
                 FROM players
                 WHERE id = ?",
        )
        .bind(id)
        .fetch_one(executor)
        .await?
        .try_into()
    }

    pub async fn save(&self, executor: impl SqliteExecutor<'_>) -> Result<()> {
        let last_rank_update = self.last_rank_update.map(to_unix_nanos).transpose()?;
        sqlx::query(
            "INSERT INTO players (id, elo, linked_account, last_rank_update, credits)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO UPDATE
                 SET elo = excluded.elo,
                     linked_account = excluded.linked_account,
                     last_rank_update = excluded.last_rank_update,
                     credits = excluded.credits",
        )
        .bind(&self.id)
        .bind(self.elo)
        .bind(&self.linked_account)
        .bind(last_rank_update)
        .bind(self.credits)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Looks a player up, registering a fresh one on first sight. This is
    /// what a successful login resolves its identity through.
    pub async fn get_or_create(pool: &SqlitePool, id: &str) -> Result<Player> {
        match Player::get(pool, id).await {
            Err(DbError::NotFound) => {
                let player = Player::new(id);
                player.save(pool).await?;
                info!("Registered new player {}", id);
                Ok(player)
            }
            found => found,
        }
    }
}
