//! Entity store: persisted league rows behind one async trait.
//!
//! Two implementations are provided:
//!
//! - [`PgEntityStore`] on PostgreSQL, with the constraints declared in
//!   [`crate::db::schema`]
//! - [`MemoryEntityStore`], which emulates the same constraints, cascades and
//!   per-team serialization in process
//!
//! Match rows can only be written from a [`ValidatedMatch`], and roster
//! activation changes only happen inside a [`RosterScope`], which holds the
//! team's lock until it is committed or dropped.

use crate::entities::{
    Map, MapId, MapPoolEntry, MapPoolEntryId, MapPoolEntryUpdate, MapUpdate, Match, MatchId,
    NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament,
    NewTournamentResult, Player, PlayerId, PlayerUpdate, RosterEntry, RosterEntryId,
    RosterEntryUpdate, Team, TeamId, TeamUpdate, Tournament, TournamentId, TournamentResult,
    TournamentResultId, TournamentResultUpdate, TournamentUpdate,
};
use crate::matches::ValidatedMatch;
use crate::roster::MAX_ACTIVE_ROSTER;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod constraints;
pub mod errors;
pub mod memory;
pub mod postgres;

pub use errors::{ConstraintKind, StoreError, StoreResult};
pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;

/// Every row of every table, read at one point in time. Rows are ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub tournaments: Vec<Tournament>,
    pub maps: Vec<Map>,
    pub map_pool: Vec<MapPoolEntry>,
    pub matches: Vec<Match>,
    pub results: Vec<TournamentResult>,
    pub roster: Vec<RosterEntry>,
}

/// Persistence for league entities
///
/// `get_*` returns `Ok(None)` for a missing row; `update_*` fails with
/// [`StoreError::NotFound`]; `delete_*` returns whether a row was removed.
/// Lists are ordered by id.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_team(&self, team: &NewTeam) -> StoreResult<Team>;
    async fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>>;
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
    async fn update_team(&self, id: TeamId, update: &TeamUpdate) -> StoreResult<Team>;
    /// Restricted while the team plays in any match
    async fn delete_team(&self, id: TeamId) -> StoreResult<bool>;

    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player>;
    async fn get_player(&self, id: PlayerId) -> StoreResult<Option<Player>>;
    async fn list_players(&self) -> StoreResult<Vec<Player>>;
    async fn update_player(&self, id: PlayerId, update: &PlayerUpdate) -> StoreResult<Player>;
    async fn delete_player(&self, id: PlayerId) -> StoreResult<bool>;

    async fn create_tournament(&self, tournament: &NewTournament) -> StoreResult<Tournament>;
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;
    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>>;
    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> StoreResult<Tournament>;
    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool>;

    async fn create_map(&self, map: &NewMap) -> StoreResult<Map>;
    async fn get_map(&self, id: MapId) -> StoreResult<Option<Map>>;
    async fn list_maps(&self) -> StoreResult<Vec<Map>>;
    async fn update_map(&self, id: MapId, update: &MapUpdate) -> StoreResult<Map>;
    async fn delete_map(&self, id: MapId) -> StoreResult<bool>;

    async fn create_map_pool_entry(&self, entry: &NewMapPoolEntry) -> StoreResult<MapPoolEntry>;
    async fn get_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<Option<MapPoolEntry>>;
    /// All entries, or only those of one map
    async fn list_map_pool_entries(&self, map: Option<MapId>) -> StoreResult<Vec<MapPoolEntry>>;
    async fn update_map_pool_entry(
        &self,
        id: MapPoolEntryId,
        update: &MapPoolEntryUpdate,
    ) -> StoreResult<MapPoolEntry>;
    async fn delete_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<bool>;

    async fn insert_match(&self, validated: &ValidatedMatch) -> StoreResult<Match>;
    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>>;
    /// All matches, or only those of one tournament
    async fn list_matches(&self, tournament: Option<TournamentId>) -> StoreResult<Vec<Match>>;
    /// Overwrite every column of an existing match
    async fn replace_match(&self, id: MatchId, validated: &ValidatedMatch) -> StoreResult<Match>;
    async fn delete_match(&self, id: MatchId) -> StoreResult<bool>;

    async fn create_tournament_result(
        &self,
        result: &NewTournamentResult,
    ) -> StoreResult<TournamentResult>;
    async fn get_tournament_result(
        &self,
        id: TournamentResultId,
    ) -> StoreResult<Option<TournamentResult>>;
    async fn list_tournament_results(
        &self,
        tournament: Option<TournamentId>,
    ) -> StoreResult<Vec<TournamentResult>>;
    async fn update_tournament_result(
        &self,
        id: TournamentResultId,
        update: &TournamentResultUpdate,
    ) -> StoreResult<TournamentResult>;
    async fn delete_tournament_result(&self, id: TournamentResultId) -> StoreResult<bool>;

    /// Open a serialized unit of work on one team's roster
    ///
    /// Blocks until no other scope for the same team is open. Fails with
    /// [`StoreError::NotFound`] if the team does not exist.
    async fn roster_scope(&self, team: TeamId) -> StoreResult<Box<dyn RosterScope>>;
    async fn get_roster_entry(&self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>>;
    /// All entries, or only those of one team
    async fn list_roster_entries(&self, team: Option<TeamId>) -> StoreResult<Vec<RosterEntry>>;
    /// Change dates only; activation goes through a [`RosterScope`]
    async fn update_roster_dates(
        &self,
        id: RosterEntryId,
        update: &RosterEntryUpdate,
    ) -> StoreResult<RosterEntry>;
    async fn delete_roster_entry(&self, id: RosterEntryId) -> StoreResult<bool>;

    /// Read every table at one consistent point in time
    async fn snapshot(&self) -> StoreResult<LeagueSnapshot>;
}

/// Exclusive access to one team's roster
///
/// No other scope for the same team can observe the state between two calls.
/// Both writes that can activate an entry enforce
/// [`crate::roster::MAX_ACTIVE_ROSTER`] themselves and only touch entries of
/// the locked team, so a caller cannot skip the ceiling by driving the scope
/// directly. Dropping a scope without calling
/// [`RosterScope::commit`] rolls back on PostgreSQL. The in-memory scope
/// writes through immediately, so dropping it only releases the lock.
#[async_trait]
pub trait RosterScope: Send {
    fn team_id(&self) -> TeamId;

    /// Active entries of the team, not counting `excluding`
    async fn active_count(&mut self, excluding: Option<RosterEntryId>) -> StoreResult<usize>;

    async fn get_entry(&mut self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>>;

    /// Fails with [`StoreError::RosterFull`] if an active entry would exceed
    /// the ceiling, or [`StoreError::OutsideRosterScope`] for another team
    async fn insert_entry(&mut self, entry: &NewRosterEntry) -> StoreResult<RosterEntry>;

    /// Same ceiling and team rules as [`RosterScope::insert_entry`]
    async fn set_active(&mut self, id: RosterEntryId, active: bool) -> StoreResult<RosterEntry>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Entries of other teams are out of reach of a roster scope
fn check_scope_team(scope_team: TeamId, team_id: TeamId) -> StoreResult<()> {
    if scope_team != team_id {
        return Err(StoreError::OutsideRosterScope {
            scope_team,
            team_id,
        });
    }
    Ok(())
}

/// One more active entry must still fit next to `others_active`
fn check_roster_room(team_id: TeamId, others_active: usize) -> StoreResult<()> {
    if others_active >= MAX_ACTIVE_ROSTER {
        return Err(StoreError::RosterFull {
            team_id,
            limit: MAX_ACTIVE_ROSTER,
        });
    }
    Ok(())
}
