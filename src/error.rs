use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::{MatchState, Team};

pub type Result<T> = std::result::Result<T, DbError>;

/// Every failure surfaced by the stores and the lifecycle service.
///
/// The store error that caused a failure is always kept as the `source`,
/// so callers can log the full chain while matching on the variant.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("constraint violated")]
    Constraint(#[source] sqlx::Error),
    #[error("transaction failed")]
    Transaction(#[source] sqlx::Error),
    /// The transaction could not be rolled back after `cause`, so its
    /// writes may not have been undone.
    #[error("rollback failed after: {cause}")]
    RollbackFailed {
        #[source]
        rollback: sqlx::Error,
        cause: Box<DbError>,
    },
    #[error("query failed")]
    Query(#[source] sqlx::Error),
    #[error("value conversion failed: {0}")]
    Conversion(String),
    #[error("new matches must start running, got {0}")]
    InvalidInitialState(MatchState),
    #[error("{0} has no players")]
    EmptyRoster(Team),
    #[error("illegal match state transition from {from} to {to}")]
    IllegalTransition { from: MatchState, to: MatchState },
    #[error("migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, DbError::Constraint(_))
    }
}

// SQLITE_CONSTRAINT primary result code; extended codes keep it in the low byte.
const SQLITE_CONSTRAINT: i32 = 19;

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };
    match db.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => true,
        _ => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| code & 0xff == SQLITE_CONSTRAINT),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            DbError::NotFound
        } else if is_constraint_violation(&err) {
            DbError::Constraint(err)
        } else {
            DbError::Query(err)
        }
    }
}
