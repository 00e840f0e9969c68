//! League manager: the single entry point for callers.
//!
//! Plain CRUD goes straight to the entity store. Match writes go through the
//! [`MatchValidator`] and roster activation through the [`RosterGuard`].
//! Neither check can be skipped through [`EsportsManager::store`]: match rows
//! need a [`crate::matches::ValidatedMatch`], and every roster scope enforces
//! the active ceiling on its own writes.

use crate::entities::{
    Map, MapId, MapPoolEntry, MapPoolEntryId, MapPoolEntryUpdate, MapUpdate, Match, MatchId,
    MatchUpdate, NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament,
    NewTournamentResult, Player, PlayerId, PlayerUpdate, RosterEntry, RosterEntryId,
    RosterEntryUpdate, Team, TeamId, TeamUpdate, Tournament, TournamentId, TournamentResult,
    TournamentResultId, TournamentResultUpdate, TournamentUpdate,
};
use crate::matches::{MatchError, MatchRequest, MatchValidator, ValidationError};
use crate::roster::{RosterError, RosterGuard};
use crate::stats::{self, MapPoolRow, TeamSummary};
use crate::store::constraints::names;
use crate::store::{EntityStore, LeagueSnapshot, MemoryEntityStore, PgEntityStore, StoreError};
use chrono::NaiveDate;
use log::info;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to callers of [`EsportsManager`]
#[derive(Debug, Error)]
pub enum EsportsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Team {team_id} already has {limit} active roster members")]
    RosterLimitExceeded { team_id: TeamId, limit: usize },

    #[error("Roster entry {entry_id} belongs to team {actual}, not team {expected}")]
    RosterTeamMismatch {
        entry_id: RosterEntryId,
        expected: TeamId,
        actual: TeamId,
    },
}

impl From<RosterError> for EsportsError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::LimitExceeded { team_id, limit } => {
                EsportsError::RosterLimitExceeded { team_id, limit }
            }
            RosterError::TeamMismatch {
                entry_id,
                expected,
                actual,
            } => EsportsError::RosterTeamMismatch {
                entry_id,
                expected,
                actual,
            },
            RosterError::Store(e) => EsportsError::Store(e),
        }
    }
}

impl From<MatchError> for EsportsError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Validation(e) => EsportsError::Validation(e),
            MatchError::Store(e) => EsportsError::Store(e),
        }
    }
}

impl EsportsError {
    /// Short message safe to show to an end user
    pub fn client_message(&self) -> String {
        match self {
            EsportsError::Store(StoreError::ConstraintViolation { constraint, .. }) => {
                match constraint.as_str() {
                    names::TEAM_NAME_UNIQUE => "team name must be unique".to_string(),
                    names::TEAM_NAME_CHK => "team name is required".to_string(),
                    names::TEAM_REGION_CHK => "region is required for a team".to_string(),
                    names::PLAYER_NAME_CHK => "player name is required".to_string(),
                    names::MAP_NAME_UNIQUE => "map name must be unique".to_string(),
                    names::MATCH_DIFFERENT_TEAMS_CHK => {
                        "team1 and team2 must be different".to_string()
                    }
                    names::MATCH_WINNER_VALID_CHK => {
                        "winner must be one of the two teams".to_string()
                    }
                    names::MATCH_TEAM1_FK | names::MATCH_TEAM2_FK => {
                        "team still plays in recorded matches".to_string()
                    }
                    names::RESULT_PLACEMENT_UNIQUE => {
                        "placement is already taken in this tournament".to_string()
                    }
                    names::ROSTER_MEMBER_UNIQUE => "player is already on this roster".to_string(),
                    other => format!("rejected by constraint {other}"),
                }
            }
            EsportsError::Store(StoreError::NotFound { entity, id }) => {
                format!("{entity} {id} does not exist")
            }
            EsportsError::Store(StoreError::Timeout(_)) => {
                "the league store is busy, try again".to_string()
            }
            EsportsError::Store(StoreError::Database(_)) => "internal storage error".to_string(),
            EsportsError::RosterLimitExceeded { limit, .. }
            | EsportsError::Store(StoreError::RosterFull { limit, .. }) => {
                format!("roster cap is {limit} active players")
            }
            other => other.to_string(),
        }
    }
}

pub type EsportsResult<T> = Result<T, EsportsError>;

fn found<T>(row: Option<T>, entity: &'static str, id: impl Into<i64>) -> EsportsResult<T> {
    row.ok_or_else(|| StoreError::not_found(entity, id).into())
}

/// League manager
#[derive(Clone)]
pub struct EsportsManager {
    store: Arc<dyn EntityStore>,
    roster_guard: RosterGuard,
    match_validator: MatchValidator,
}

impl EsportsManager {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            roster_guard: RosterGuard::new(Arc::clone(&store)),
            match_validator: MatchValidator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Manager over a fresh [`MemoryEntityStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryEntityStore::new()))
    }

    /// Manager over a [`PgEntityStore`] on `pool`
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PgEntityStore::new(pool)))
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    // Teams

    pub async fn create_team(&self, team: &NewTeam) -> EsportsResult<Team> {
        let created = self.store.create_team(team).await?;
        info!("Created team {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_team(&self, id: TeamId) -> EsportsResult<Team> {
        found(self.store.get_team(id).await?, "Team", id)
    }

    pub async fn list_teams(&self) -> EsportsResult<Vec<Team>> {
        Ok(self.store.list_teams().await?)
    }

    pub async fn update_team(&self, id: TeamId, update: &TeamUpdate) -> EsportsResult<Team> {
        Ok(self.store.update_team(id, update).await?)
    }

    /// Delete a team, clearing it from players and dropping its roster and
    /// results. Fails while the team appears in any match.
    pub async fn delete_team(&self, id: TeamId) -> EsportsResult<bool> {
        let deleted = self.store.delete_team(id).await?;
        if deleted {
            info!("Deleted team {id}");
        }
        Ok(deleted)
    }

    // Players

    pub async fn create_player(&self, player: &NewPlayer) -> EsportsResult<Player> {
        let created = self.store.create_player(player).await?;
        info!("Created player {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_player(&self, id: PlayerId) -> EsportsResult<Player> {
        found(self.store.get_player(id).await?, "Player", id)
    }

    pub async fn list_players(&self) -> EsportsResult<Vec<Player>> {
        Ok(self.store.list_players().await?)
    }

    pub async fn update_player(
        &self,
        id: PlayerId,
        update: &PlayerUpdate,
    ) -> EsportsResult<Player> {
        Ok(self.store.update_player(id, update).await?)
    }

    pub async fn delete_player(&self, id: PlayerId) -> EsportsResult<bool> {
        Ok(self.store.delete_player(id).await?)
    }

    // Tournaments

    pub async fn create_tournament(&self, tournament: &NewTournament) -> EsportsResult<Tournament> {
        let created = self.store.create_tournament(tournament).await?;
        info!("Created tournament {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_tournament(&self, id: TournamentId) -> EsportsResult<Tournament> {
        found(self.store.get_tournament(id).await?, "Tournament", id)
    }

    pub async fn list_tournaments(&self) -> EsportsResult<Vec<Tournament>> {
        Ok(self.store.list_tournaments().await?)
    }

    pub async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> EsportsResult<Tournament> {
        Ok(self.store.update_tournament(id, update).await?)
    }

    /// Delete a tournament together with its matches and results
    pub async fn delete_tournament(&self, id: TournamentId) -> EsportsResult<bool> {
        let deleted = self.store.delete_tournament(id).await?;
        if deleted {
            info!("Deleted tournament {id}");
        }
        Ok(deleted)
    }

    // Maps and map pool

    pub async fn create_map(&self, map: &NewMap) -> EsportsResult<Map> {
        Ok(self.store.create_map(map).await?)
    }

    pub async fn get_map(&self, id: MapId) -> EsportsResult<Map> {
        found(self.store.get_map(id).await?, "Map", id)
    }

    pub async fn list_maps(&self) -> EsportsResult<Vec<Map>> {
        Ok(self.store.list_maps().await?)
    }

    pub async fn update_map(&self, id: MapId, update: &MapUpdate) -> EsportsResult<Map> {
        Ok(self.store.update_map(id, update).await?)
    }

    /// Delete a map with its pool history and the matches played on it
    pub async fn delete_map(&self, id: MapId) -> EsportsResult<bool> {
        Ok(self.store.delete_map(id).await?)
    }

    pub async fn record_map_pool_entry(
        &self,
        entry: &NewMapPoolEntry,
    ) -> EsportsResult<MapPoolEntry> {
        Ok(self.store.create_map_pool_entry(entry).await?)
    }

    pub async fn get_map_pool_entry(&self, id: MapPoolEntryId) -> EsportsResult<MapPoolEntry> {
        found(self.store.get_map_pool_entry(id).await?, "MapPoolEntry", id)
    }

    pub async fn list_map_pool_entries(
        &self,
        map: Option<MapId>,
    ) -> EsportsResult<Vec<MapPoolEntry>> {
        Ok(self.store.list_map_pool_entries(map).await?)
    }

    pub async fn update_map_pool_entry(
        &self,
        id: MapPoolEntryId,
        update: &MapPoolEntryUpdate,
    ) -> EsportsResult<MapPoolEntry> {
        Ok(self.store.update_map_pool_entry(id, update).await?)
    }

    pub async fn delete_map_pool_entry(&self, id: MapPoolEntryId) -> EsportsResult<bool> {
        Ok(self.store.delete_map_pool_entry(id).await?)
    }

    // Matches

    /// Validate and record a match
    pub async fn create_match(&self, request: MatchRequest) -> EsportsResult<MatchId> {
        Ok(self.match_validator.create_match(request).await?)
    }

    pub async fn get_match(&self, id: MatchId) -> EsportsResult<Match> {
        found(self.store.get_match(id).await?, "Match", id)
    }

    /// All matches, or those of one tournament
    pub async fn list_matches(
        &self,
        tournament: Option<TournamentId>,
    ) -> EsportsResult<Vec<Match>> {
        Ok(self.store.list_matches(tournament).await?)
    }

    /// Merge `update` into the stored match and re-validate before writing
    pub async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> EsportsResult<Match> {
        Ok(self.match_validator.update_match(id, update).await?)
    }

    pub async fn delete_match(&self, id: MatchId) -> EsportsResult<bool> {
        Ok(self.store.delete_match(id).await?)
    }

    // Tournament results

    pub async fn record_tournament_result(
        &self,
        result: &NewTournamentResult,
    ) -> EsportsResult<TournamentResult> {
        let created = self.store.create_tournament_result(result).await?;
        info!(
            "Team {} placed {} in tournament {}",
            created.team_id, created.placement, created.tournament_id
        );
        Ok(created)
    }

    pub async fn get_tournament_result(
        &self,
        id: TournamentResultId,
    ) -> EsportsResult<TournamentResult> {
        found(
            self.store.get_tournament_result(id).await?,
            "TournamentResult",
            id,
        )
    }

    pub async fn list_tournament_results(
        &self,
        tournament: Option<TournamentId>,
    ) -> EsportsResult<Vec<TournamentResult>> {
        Ok(self.store.list_tournament_results(tournament).await?)
    }

    pub async fn update_tournament_result(
        &self,
        id: TournamentResultId,
        update: &TournamentResultUpdate,
    ) -> EsportsResult<TournamentResult> {
        Ok(self.store.update_tournament_result(id, update).await?)
    }

    pub async fn delete_tournament_result(&self, id: TournamentResultId) -> EsportsResult<bool> {
        Ok(self.store.delete_tournament_result(id).await?)
    }

    // Roster

    /// Add a player to a team's roster, enforcing the active ceiling
    pub async fn add_roster_entry(&self, entry: &NewRosterEntry) -> EsportsResult<RosterEntry> {
        Ok(self.roster_guard.add_roster_entry(entry).await?)
    }

    /// Activate or deactivate a roster entry, enforcing the active ceiling
    pub async fn set_roster_active(
        &self,
        entry_id: RosterEntryId,
        team_id: TeamId,
        make_active: bool,
    ) -> EsportsResult<RosterEntry> {
        Ok(self
            .roster_guard
            .set_roster_active(entry_id, team_id, make_active)
            .await?)
    }

    pub async fn get_roster_entry(&self, id: RosterEntryId) -> EsportsResult<RosterEntry> {
        found(self.store.get_roster_entry(id).await?, "RosterEntry", id)
    }

    /// All roster entries, or one team's roster
    pub async fn list_roster_entries(
        &self,
        team: Option<TeamId>,
    ) -> EsportsResult<Vec<RosterEntry>> {
        Ok(self.store.list_roster_entries(team).await?)
    }

    pub async fn update_roster_entry(
        &self,
        id: RosterEntryId,
        update: &RosterEntryUpdate,
    ) -> EsportsResult<RosterEntry> {
        Ok(self.store.update_roster_dates(id, update).await?)
    }

    pub async fn delete_roster_entry(&self, id: RosterEntryId) -> EsportsResult<bool> {
        Ok(self.store.delete_roster_entry(id).await?)
    }

    // Aggregation

    /// Consistent read of every table, for building several views at once
    pub async fn snapshot(&self) -> EsportsResult<LeagueSnapshot> {
        Ok(self.store.snapshot().await?)
    }

    /// Matches played, wins and earnings per team, ordered by team name
    pub async fn team_summary(&self) -> EsportsResult<Vec<TeamSummary>> {
        Ok(stats::team_summary(&self.snapshot().await?))
    }

    /// Pool standing of every map at `as_of`, ordered by map name
    pub async fn map_pool_status(&self, as_of: NaiveDate) -> EsportsResult<Vec<MapPoolRow>> {
        Ok(stats::map_pool_status(&self.snapshot().await?, as_of))
    }

    pub async fn earnings_by_team(&self) -> EsportsResult<Vec<stats::TeamEarnings>> {
        Ok(stats::earnings_by_team(&self.snapshot().await?))
    }

    pub async fn wins_by_map(&self) -> EsportsResult<Vec<stats::MapWins>> {
        Ok(stats::wins_by_map(&self.snapshot().await?))
    }

    pub async fn active_roster_counts(&self) -> EsportsResult<Vec<stats::ActiveRoster>> {
        Ok(stats::active_roster_counts(&self.snapshot().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConstraintKind;

    #[test]
    fn test_client_message_for_known_constraint() {
        let err = EsportsError::from(StoreError::violation(
            ConstraintKind::Check,
            names::TEAM_REGION_CHK,
        ));
        assert_eq!(err.client_message(), "region is required for a team");
    }

    #[test]
    fn test_client_message_for_roster_cap() {
        let err = EsportsError::from(RosterError::LimitExceeded {
            team_id: TeamId(1),
            limit: 5,
        });
        assert_eq!(err.client_message(), "roster cap is 5 active players");
    }

    #[test]
    fn test_client_message_for_full_roster_scope() {
        let err = EsportsError::from(StoreError::RosterFull {
            team_id: TeamId(1),
            limit: 5,
        });
        assert_eq!(err.client_message(), "roster cap is 5 active players");
    }

    #[test]
    fn test_client_message_hides_database_details() {
        let err = EsportsError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.client_message(), "internal storage error");
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = EsportsError::from(MatchError::Validation(ValidationError::MissingScore));
        assert_eq!(
            err.client_message(),
            "Both scores are required when a winner is declared"
        );
    }

    #[tokio::test]
    async fn test_get_missing_team_is_not_found() {
        let manager = EsportsManager::in_memory();
        let err = manager.get_team(TeamId(3)).await.unwrap_err();
        assert_eq!(err.client_message(), "Team 3 does not exist");
    }
}
