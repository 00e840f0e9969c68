//! Storage error types.

use crate::db::timeouts::TimeoutError;
use crate::entities::TeamId;
use std::{fmt, time::Duration};
use thiserror::Error;

/// Class of storage constraint that rejected a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not-null",
            ConstraintKind::Check => "check",
        })
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A declarative constraint rejected the write
    #[error("Constraint violation ({kind}): {constraint}")]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: String,
    },

    /// Referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Activation would take the team past its active roster ceiling
    #[error("Team {team_id} already has {limit} active roster members")]
    RosterFull { team_id: TeamId, limit: usize },

    /// Roster write for a team other than the one the scope locked
    #[error("Roster scope of team {scope_team} cannot write entries of team {team_id}")]
    OutsideRosterScope { scope_team: TeamId, team_id: TeamId },

    /// Lock or query did not complete in time
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn violation(kind: ConstraintKind, constraint: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            kind,
            constraint: constraint.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Name of the violated constraint, if this is a constraint violation
    pub fn constraint(&self) -> Option<&str> {
        match self {
            StoreError::ConstraintViolation { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                sqlx::error::ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                sqlx::error::ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                sqlx::error::ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                _ => None,
            }
            .map(|kind| (kind, db_err.constraint().unwrap_or("unknown").to_string())),
            _ => None,
        };

        match kind {
            Some((kind, constraint)) => StoreError::ConstraintViolation { kind, constraint },
            None => StoreError::Database(err),
        }
    }
}

impl From<TimeoutError> for StoreError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => StoreError::Timeout(duration),
            TimeoutError::Database(e) => StoreError::from(e),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_names_constraint() {
        let err = StoreError::violation(ConstraintKind::Unique, "teams_team_name_key");
        assert_eq!(
            err.to_string(),
            "Constraint violation (unique): teams_team_name_key"
        );
        assert_eq!(err.constraint(), Some("teams_team_name_key"));
    }

    #[test]
    fn test_row_not_found_is_plain_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(err.constraint(), None);
    }

    #[test]
    fn test_timeout_conversion() {
        let err = StoreError::from(TimeoutError::Timeout(Duration::from_secs(10)));
        assert!(matches!(err, StoreError::Timeout(d) if d.as_secs() == 10));
    }
}
