//! Typed surrogate keys.
//!
//! Every stored row is addressed by a database-assigned `BIGSERIAL`. Wrapping
//! the raw integer per entity keeps a `TeamId` from being passed where a
//! `MapId` is expected, and lets optional references be spelled
//! `Option<TeamId>` instead of relying on a sentinel value.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

entity_id!(
    /// Team ID
    TeamId
);
entity_id!(
    /// Player ID
    PlayerId
);
entity_id!(
    /// Tournament ID
    TournamentId
);
entity_id!(
    /// Map ID
    MapId
);
entity_id!(
    /// Map pool entry ID
    MapPoolEntryId
);
entity_id!(
    /// Match ID
    MatchId
);
entity_id!(
    /// Tournament result ID
    TournamentResultId
);
entity_id!(
    /// Roster entry ID
    RosterEntryId
);
