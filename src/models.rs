use strum::{Display, EnumIter};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{DbError, Result};

/// Lifecycle stage of a match.
///
/// `Running` and `AwaitingVotes` keep the players of the match occupied,
/// every other state is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MatchState {
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "awaiting_votes")]
    AwaitingVotes,
    #[strum(serialize = "team1_won")]
    Team1Won,
    #[strum(serialize = "team2_won")]
    Team2Won,
    #[strum(serialize = "cancelled")]
    Cancelled,
}

impl MatchState {
    pub fn is_active(self) -> bool {
        matches!(self, MatchState::Running | MatchState::AwaitingVotes)
    }

    pub fn is_finalized(self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(self, next: MatchState) -> bool {
        use MatchState::*;
        self == next
            || matches!(
                (self, next),
                (Running, AwaitingVotes)
                    | (Running, Cancelled)
                    | (AwaitingVotes, Team1Won)
                    | (AwaitingVotes, Team2Won)
                    | (AwaitingVotes, Cancelled)
            )
    }

    // Active states are <= 0 in storage, the roster store relies on it.
    pub(crate) fn code(self) -> i64 {
        match self {
            MatchState::Running => 0,
            MatchState::AwaitingVotes => -1,
            MatchState::Team1Won => 1,
            MatchState::Team2Won => 2,
            MatchState::Cancelled => 3,
        }
    }

    pub(crate) fn from_code(code: i64) -> Option<MatchState> {
        match code {
            0 => Some(MatchState::Running),
            -1 => Some(MatchState::AwaitingVotes),
            1 => Some(MatchState::Team1Won),
            2 => Some(MatchState::Team2Won),
            3 => Some(MatchState::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Team {
    #[strum(serialize = "team 1")]
    One,
    #[strum(serialize = "team 2")]
    Two,
}

impl Team {
    pub(crate) fn code(self) -> i64 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }
}

/// A player as known to the directory. Only the id is owned by a match,
/// the rest is joined in when rosters are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub elo: i64,
    pub linked_account: Option<String>,
    pub last_rank_update: Option<OffsetDateTime>,
    pub credits: i64,
}

impl Player {
    pub const DEFAULT_ELO: i64 = 1000;

    pub fn new(id: impl Into<String>) -> Player {
        Player {
            id: id.into(),
            elo: Player::DEFAULT_ELO,
            linked_account: None,
            last_rank_update: None,
            credits: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub thread_id: String,
    pub message_id: String,
    pub vote_message_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub state: MatchState,
    pub team1_score: i32,
    pub team2_score: i32,
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
}

impl Match {
    pub fn new(
        thread_id: impl Into<String>,
        message_id: impl Into<String>,
        team1: Vec<Player>,
        team2: Vec<Player>,
    ) -> Match {
        Match {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            message_id: message_id.into(),
            vote_message_id: None,
            created_at: OffsetDateTime::now_utc(),
            state: MatchState::Running,
            team1_score: 0,
            team2_score: 0,
            team1,
            team2,
        }
    }

    pub fn team(&self, team: Team) -> &[Player] {
        match team {
            Team::One => &self.team1,
            Team::Two => &self.team2,
        }
    }

    /// Moves the match to `next`, leaving it untouched if the lifecycle
    /// does not allow that step.
    pub fn transition_to(&mut self, next: MatchState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(DbError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Records the voted result. The higher score wins, a draw cancels the match.
    pub fn finalize(&mut self, team1_score: i32, team2_score: i32) -> Result<()> {
        let outcome = match team1_score.cmp(&team2_score) {
            std::cmp::Ordering::Greater => MatchState::Team1Won,
            std::cmp::Ordering::Less => MatchState::Team2Won,
            std::cmp::Ordering::Equal => MatchState::Cancelled,
        };
        if self.state != MatchState::AwaitingVotes {
            return Err(DbError::IllegalTransition {
                from: self.state,
                to: outcome,
            });
        }
        self.transition_to(outcome)?;
        self.team1_score = team1_score;
        self.team2_score = team2_score;
        Ok(())
    }
}
