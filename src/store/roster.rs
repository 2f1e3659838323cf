use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{DbError, Result};
use crate::models::{Player, Team};
use crate::store::players::PlayerRow;

/// One `match_players` row: a player's seat on one team of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub match_id: String,
    pub player_id: String,
    pub team: Team,
}

#[derive(Debug, FromRow)]
struct RosterRow {
    match_id: String,
    player_id: String,
    team: i64,
}

impl TryFrom<RosterRow> for RosterEntry {
    type Error = DbError;

    fn try_from(row: RosterRow) -> Result<RosterEntry> {
        let team = match row.team {
            1 => Team::One,
            2 => Team::Two,
            other => {
                return Err(DbError::Conversion(format!(
                    "unknown team {} in match {}",
                    other, row.match_id
                )))
            }
        };
        Ok(RosterEntry {
            match_id: row.match_id,
            player_id: row.player_id,
            team,
        })
    }
}

impl RosterEntry {
    /// Seats every player on `team`. Must share the transaction that inserted
    /// the match.
    pub async fn insert_many(
        conn: &mut SqliteConnection,
        match_id: &str,
        team: Team,
        players: &[Player],
    ) -> Result<()> {
        for player in players {
            sqlx::query("INSERT INTO match_players (match_id, player_id, team) VALUES (?, ?, ?)")
                .bind(match_id)
                .bind(&player.id)
                .bind(team.code())
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn get_team(
        executor: impl SqliteExecutor<'_>,
        match_id: &str,
        team: Team,
    ) -> Result<Vec<Player>> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            "SELECT players.id, players.elo, players.linked_account, players.last_rank_update, players.credits
                 FROM players
                 JOIN match_players
                    ON match_players.player_id = players.id
                 WHERE match_players.match_id = ? AND match_players.team = ?",
        )
        .bind(match_id)
        .bind(team.code())
        .fetch_all(executor)
        .await?;
        rows.into_iter().map(Player::try_from).collect()
    }

    /// Every roster row of a match, team 1 first.
    pub async fn get_by_match(
        executor: impl SqliteExecutor<'_>,
        match_id: &str,
    ) -> Result<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterRow>(
            "SELECT match_id, player_id, team
                 FROM match_players
                 WHERE match_id = ?
                 ORDER BY team, player_id",
        )
        .bind(match_id)
        .fetch_all(executor)
        .await?;
        rows.into_iter().map(RosterEntry::try_from).collect()
    }

    /// Whether the player sits in any match that is still running or waiting
    /// for votes.
    pub async fn player_has_active_match(
        executor: impl SqliteExecutor<'_>,
        player_id: &str,
    ) -> Result<bool> {
        // Active states are stored as codes <= 0.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
                 FROM matches
                 JOIN match_players
                    ON matches.id = match_players.match_id
                 WHERE match_players.player_id = ? AND matches.state <= 0",
        )
        .bind(player_id)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }
}
