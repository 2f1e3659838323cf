//! Match lifecycle on top of the stores.
//!
//! Creation is the only multi-statement write and runs in one transaction:
//! either the match row and both rosters become visible together, or none of
//! them do. Aggregate reads load the match row and both rosters inside one
//! read transaction, so a returned [`Match`] is a single snapshot.
//!
//! Nothing here takes an in-process lock. A player may pass
//! [`MatchService::is_player_in_active_match`] while a concurrent
//! [`MatchService::create_match`] seats them elsewhere; callers that need
//! exclusivity have to arrange it themselves.

use log::{debug, error, warn};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, Result};
use crate::models::{Match, MatchState, Team};
use crate::store::roster::RosterEntry;

/// Upper bound on [`MatchService::list_running_matches`].
pub const RUNNING_MATCHES_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct MatchService {
    pool: SqlitePool,
}

async fn write_match(conn: &mut SqliteConnection, m: &Match) -> Result<()> {
    m.insert(&mut *conn).await?;
    RosterEntry::insert_many(&mut *conn, &m.id, Team::One, &m.team1).await?;
    RosterEntry::insert_many(&mut *conn, &m.id, Team::Two, &m.team2).await?;
    Ok(())
}

fn rollback_outcome(
    match_id: &str,
    cause: DbError,
    rollback: std::result::Result<(), sqlx::Error>,
) -> DbError {
    match rollback {
        Ok(()) => cause,
        Err(rollback) => {
            error!(
                "Rollback of match {} failed after {}: {}",
                match_id, cause, rollback
            );
            DbError::RollbackFailed {
                rollback,
                cause: Box::new(cause),
            }
        }
    }
}

async fn load_teams(conn: &mut SqliteConnection, m: &mut Match) -> Result<()> {
    m.team1 = RosterEntry::get_team(&mut *conn, &m.id, Team::One).await?;
    m.team2 = RosterEntry::get_team(&mut *conn, &m.id, Team::Two).await?;
    Ok(())
}

impl MatchService {
    pub fn new(pool: SqlitePool) -> MatchService {
        MatchService { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts the match and both rosters atomically.
    ///
    /// On failure the transaction is rolled back and the write error is
    /// returned. If the rollback fails too, [`DbError::RollbackFailed`] is
    /// returned instead, carrying the write error as its cause.
    pub async fn create_match(&self, m: &Match) -> Result<()> {
        if m.state != MatchState::Running {
            return Err(DbError::InvalidInitialState(m.state));
        }
        for team in [Team::One, Team::Two] {
            if m.team(team).is_empty() {
                return Err(DbError::EmptyRoster(team));
            }
        }
        let mut transaction = self.pool.begin().await.map_err(DbError::Transaction)?;
        if let Err(cause) = write_match(&mut transaction, m).await {
            return Err(rollback_outcome(&m.id, cause, transaction.rollback().await));
        }
        // a failed commit leaves the transaction open, dropping it rolls back
        transaction.commit().await.map_err(DbError::Transaction)?;
        debug!(
            "Created match {} ({} vs {} players)",
            m.id,
            m.team1.len(),
            m.team2.len()
        );
        Ok(())
    }

    /// Persists state, scores and vote message. Rosters are never touched and
    /// an unknown id is not an error, it only gets logged.
    ///
    /// The new state is checked against the stored one, so a stale copy
    /// cannot move a match backwards or out of a final state.
    pub async fn update_match(&self, m: &Match) -> Result<()> {
        let stored = match Match::get_state(&self.pool, &m.id).await {
            Ok(stored) => stored,
            Err(DbError::NotFound) => {
                warn!("Update of match {} matched no rows", m.id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if !stored.can_transition_to(m.state) {
            return Err(DbError::IllegalTransition {
                from: stored,
                to: m.state,
            });
        }
        if !m.update_state(&self.pool, stored).await? {
            warn!(
                "Match {} left state {} before it could be updated",
                m.id, stored
            );
        }
        Ok(())
    }

    /// Moves `m` to `next` if the lifecycle allows it, then persists it.
    /// Illegal steps are rejected before anything is written and `m` keeps
    /// its state when the write fails.
    pub async fn transition_match(&self, m: &mut Match, next: MatchState) -> Result<()> {
        let previous = m.state;
        m.transition_to(next)?;
        if let Err(e) = self.update_match(m).await {
            m.state = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Records the voted result of a match that is awaiting votes.
    pub async fn finalize_match(
        &self,
        m: &mut Match,
        team1_score: i32,
        team2_score: i32,
    ) -> Result<()> {
        let previous = (m.state, m.team1_score, m.team2_score);
        m.finalize(team1_score, team2_score)?;
        if let Err(e) = self.update_match(m).await {
            (m.state, m.team1_score, m.team2_score) = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn get_match_by_id(&self, id: &str) -> Result<Match> {
        let mut transaction = self.pool.begin().await.map_err(DbError::Transaction)?;
        let mut m = Match::get_by_id(&mut *transaction, id).await?;
        load_teams(&mut transaction, &mut m).await?;
        transaction.commit().await.map_err(DbError::Transaction)?;
        Ok(m)
    }

    pub async fn get_match_by_thread_id(&self, thread_id: &str) -> Result<Match> {
        let mut transaction = self.pool.begin().await.map_err(DbError::Transaction)?;
        let mut m = Match::get_by_thread_id(&mut *transaction, thread_id).await?;
        load_teams(&mut transaction, &mut m).await?;
        transaction.commit().await.map_err(DbError::Transaction)?;
        Ok(m)
    }

    /// Up to [`RUNNING_MATCHES_LIMIT`] running matches, oldest first.
    pub async fn list_running_matches(&self) -> Result<Vec<Match>> {
        let mut transaction = self.pool.begin().await.map_err(DbError::Transaction)?;
        let mut matches =
            Match::list_by_state(&mut *transaction, MatchState::Running, RUNNING_MATCHES_LIMIT)
                .await?;
        for m in &mut matches {
            load_teams(&mut transaction, m).await?;
        }
        transaction.commit().await.map_err(DbError::Transaction)?;
        Ok(matches)
    }

    pub async fn list_matches_awaiting_votes(&self) -> Result<Vec<Match>> {
        let mut transaction = self.pool.begin().await.map_err(DbError::Transaction)?;
        let mut matches = Match::list_awaiting_votes(&mut *transaction).await?;
        for m in &mut matches {
            load_teams(&mut transaction, m).await?;
        }
        transaction.commit().await.map_err(DbError::Transaction)?;
        Ok(matches)
    }

    /// Gate for queueing: true while the player sits in a running match or
    /// one that is awaiting votes.
    pub async fn is_player_in_active_match(&self, player_id: &str) -> Result<bool> {
        RosterEntry::player_has_active_match(&self.pool, player_id).await
    }
}
