use crate::entities::{RosterEntryId, TeamId};
use crate::store::StoreError;
use thiserror::Error;

/// Roster guard errors
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Team {team_id} already has {limit} active roster members")]
    LimitExceeded { team_id: TeamId, limit: usize },

    #[error("Roster entry {entry_id} belongs to team {actual}, not team {expected}")]
    TeamMismatch {
        entry_id: RosterEntryId,
        expected: TeamId,
        actual: TeamId,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for roster guard operations
pub type RosterResult<T> = Result<T, RosterError>;
