//! # Esports DB
//!
//! Storage and business rules for a competitive esports league: teams,
//! players, tournaments, maps and their pool history, matches, tournament
//! results and team rosters.
//!
//! Column-level rules (unique names, non-negative scores, date ordering)
//! are storage constraints. Two rules span rows and are enforced in Rust:
//!
//! - **Roster ceiling**: a team has at most [`roster::MAX_ACTIVE_ROSTER`]
//!   active roster entries. The store's roster scope checks every activation
//!   and writes it while the team's roster is locked, so neither concurrent
//!   activations nor direct store access can overshoot.
//! - **Score/winner consistency**: a declared winner is one of the two teams,
//!   both scores are present and not tied, and the winner has the higher
//!   score. Match rows can only be written from a [`matches::ValidatedMatch`].
//!
//! ## Core Modules
//!
//! - [`entities`]: rows, creation payloads, partial updates and typed ids
//! - [`store`]: the [`store::EntityStore`] trait with PostgreSQL and in-memory
//!   backends
//! - [`roster`]: the roster guard
//! - [`matches`]: the match validator
//! - [`stats`]: aggregated views (team summary, map pool status, ...)
//! - [`manager`]: [`EsportsManager`], the facade tying them together
//!
//! ## Example
//!
//! ```
//! use esports_db::EsportsManager;
//! use esports_db::entities::{NewPlayer, NewRosterEntry, NewTeam};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), esports_db::EsportsError> {
//! let league = EsportsManager::in_memory();
//! let team = league.create_team(&NewTeam::new("Team Spirit", "CIS")).await?;
//! let player = league.create_player(&NewPlayer::new("donk")).await?;
//! league
//!     .add_roster_entry(&NewRosterEntry::new(team.id, player.id))
//!     .await?;
//!
//! let summary = league.team_summary().await?;
//! assert_eq!(summary[0].matches_played, 0);
//! # Ok(())
//! # }
//! ```

/// PostgreSQL connection pooling, schema and timeouts.
pub mod db;

/// Entity rows and typed ids.
pub mod entities;

/// League facade.
pub mod manager;
pub use manager::{EsportsError, EsportsManager, EsportsResult};

/// Match validator.
pub mod matches;

/// Roster guard.
pub mod roster;

/// Aggregated read-only views.
pub mod stats;

/// Entity store trait and backends.
pub mod store;
