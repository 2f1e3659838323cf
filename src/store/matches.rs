use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

use crate::error::{DbError, Result};
use crate::models::{Match, MatchState};
use crate::store::{from_unix_nanos, to_unix_nanos};

#[derive(Debug, FromRow)]
struct MatchRow {
    id: String,
    thread_id: String,
    message_id: String,
    vote_message_id: Option<String>,
    created_at: i64,
    state: i64,
    team1_score: i32,
    team2_score: i32,
}

impl TryFrom<MatchRow> for Match {
    type Error = DbError;

    fn try_from(row: MatchRow) -> Result<Match> {
        let state = MatchState::from_code(row.state).ok_or_else(|| {
            DbError::Conversion(format!("unknown state {} for match {}", row.state, row.id))
        })?;
        Ok(Match {
            created_at: from_unix_nanos(row.created_at)?,
            id: row.id,
            thread_id: row.thread_id,
            message_id: row.message_id,
            vote_message_id: row.vote_message_id,
            state,
            team1_score: row.team1_score,
            team2_score: row.team2_score,
            team1: Vec::new(),
            team2: Vec::new(),
        })
    }
}

fn into_matches(rows: Vec<MatchRow>) -> Result<Vec<Match>> {
    rows.into_iter().map(Match::try_from).collect()
}

/// Single-row access to the `matches` table. Everything read here comes back
/// with empty teams, `MatchService` fills them in.
impl Match {
    /// Writes the match row only. Meant to run inside the transaction that
    /// also writes the rosters.
    pub async fn insert(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO matches
                    (id, thread_id, message_id, vote_message_id, created_at, state, team1_score, team2_score)
                 VALUES
                    (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.id)
        .bind(&self.thread_id)
        .bind(&self.message_id)
        .bind(&self.vote_message_id)
        .bind(to_unix_nanos(self.created_at)?)
        .bind(self.state.code())
        .bind(self.team1_score)
        .bind(self.team2_score)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Overwrites state, scores and the vote message, but only while the
    /// stored state is still `from`. Returns whether a row was hit.
    pub(crate) async fn update_state(
        &self,
        executor: impl SqliteExecutor<'_>,
        from: MatchState,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE matches
                 SET state = ?, team1_score = ?, team2_score = ?, vote_message_id = ?
                 WHERE id = ? AND state = ?",
        )
        .bind(self.state.code())
        .bind(self.team1_score)
        .bind(self.team2_score)
        .bind(&self.vote_message_id)
        .bind(&self.id)
        .bind(from.code())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_state(executor: impl SqliteExecutor<'_>, id: &str) -> Result<MatchState> {
        let code: i64 = sqlx::query_scalar("SELECT state FROM matches WHERE id = ?")
            .bind(id)
            .fetch_one(executor)
            .await?;
        MatchState::from_code(code)
            .ok_or_else(|| DbError::Conversion(format!("unknown state {code} for match {id}")))
    }

    pub async fn get_by_id(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Match> {
        sqlx::query_as::<_, MatchRow>("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_one(executor)
            .await?
            .try_into()
    }

    pub async fn get_by_thread_id(
        executor: impl SqliteExecutor<'_>,
        thread_id: &str,
    ) -> Result<Match> {
        sqlx::query_as::<_, MatchRow>(
            "SELECT * FROM matches WHERE thread_id = ? ORDER BY created_at ASC LIMIT 1",
        )
        .bind(thread_id)
        .fetch_one(executor)
        .await?
        .try_into()
    }

    /// Oldest first, at most `limit` rows.
    pub async fn list_by_state(
        executor: impl SqliteExecutor<'_>,
        state: MatchState,
        limit: i64,
    ) -> Result<Vec<Match>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            "SELECT * FROM matches
                 WHERE state = ?
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?",
        )
        .bind(state.code())
        .bind(limit)
        .fetch_all(executor)
        .await?;
        into_matches(rows)
    }

    pub async fn list_awaiting_votes(executor: impl SqliteExecutor<'_>) -> Result<Vec<Match>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            "SELECT * FROM matches WHERE state = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(MatchState::AwaitingVotes.code())
        .fetch_all(executor)
        .await?;
        into_matches(rows)
    }
}
