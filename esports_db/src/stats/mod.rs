//! Aggregation engine.
//!
//! Read-only views folded over a [`crate::store::LeagueSnapshot`]. Each view
//! is a pure function, so every figure in a report comes from the same
//! point in time when the report is built from one snapshot.

pub mod map_pool;
pub mod overview;
pub mod summary;

pub use map_pool::{MapPoolListing, MapPoolRow, map_pool_status};
pub use overview::{EntityCounts, MatchLine, entity_counts, match_lines};
pub use summary::{
    ActiveRoster, MapWins, TeamEarnings, TeamSummary, active_roster_counts, earnings_by_team,
    team_summary, wins_by_map,
};
