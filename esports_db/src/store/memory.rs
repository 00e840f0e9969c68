//! In-process entity store.
//!
//! Tables live behind one `RwLock`; roster scopes additionally hold a
//! per-team mutex. Locks are always taken team first, tables second.

use super::constraints::{self, names};
use super::errors::{ConstraintKind, StoreError, StoreResult};
use super::{EntityStore, LeagueSnapshot, RosterScope, check_roster_room, check_scope_team};
use crate::db::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use crate::entities::{
    Map, MapId, MapPoolEntry, MapPoolEntryId, MapPoolEntryUpdate, MapUpdate, Match, MatchId,
    NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament,
    NewTournamentResult, Player, PlayerId, PlayerUpdate, RosterEntry, RosterEntryId,
    RosterEntryUpdate, Team, TeamId, TeamUpdate, Tournament, TournamentId, TournamentResult,
    TournamentResultId, TournamentResultUpdate, TournamentUpdate,
};
use crate::matches::ValidatedMatch;
use async_trait::async_trait;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Rows keyed by id, with a sequence that never reuses ids
struct Table<K, V> {
    rows: BTreeMap<K, V>,
    last_id: i64,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Ord + Copy + From<i64>,
    V: Clone,
{
    fn next_id(&mut self) -> K {
        self.last_id += 1;
        K::from(self.last_id)
    }

    fn get(&self, id: K) -> Option<V> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: K) -> bool {
        self.rows.contains_key(&id)
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.rows.values()
    }

    fn list(&self) -> Vec<V> {
        self.rows.values().cloned().collect()
    }

    fn list_where(&self, keep: impl Fn(&V) -> bool) -> Vec<V> {
        self.rows.values().filter(|v| keep(v)).cloned().collect()
    }

    fn put(&mut self, id: K, row: V) {
        self.rows.insert(id, row);
    }

    fn remove(&mut self, id: K) -> bool {
        self.rows.remove(&id).is_some()
    }
}

#[derive(Default)]
struct Tables {
    teams: Table<TeamId, Team>,
    players: Table<PlayerId, Player>,
    tournaments: Table<TournamentId, Tournament>,
    maps: Table<MapId, Map>,
    map_pool: Table<MapPoolEntryId, MapPoolEntry>,
    matches: Table<MatchId, Match>,
    results: Table<TournamentResultId, TournamentResult>,
    roster: Table<RosterEntryId, RosterEntry>,
}

fn foreign_key(exists: bool, constraint: &'static str) -> StoreResult<()> {
    if exists {
        Ok(())
    } else {
        Err(StoreError::violation(ConstraintKind::ForeignKey, constraint))
    }
}

fn unique(taken: bool, constraint: &'static str) -> StoreResult<()> {
    if taken {
        Err(StoreError::violation(ConstraintKind::Unique, constraint))
    } else {
        Ok(())
    }
}

impl Tables {
    fn check_team_row(&self, team: &Team) -> StoreResult<()> {
        constraints::check_team(team)?;
        unique(
            self.teams
                .values()
                .any(|t| t.id != team.id && t.name == team.name),
            names::TEAM_NAME_UNIQUE,
        )
    }

    fn check_player_row(&self, player: &Player) -> StoreResult<()> {
        constraints::check_player(player)?;
        foreign_key(
            player.team_id.is_none_or(|t| self.teams.contains(t)),
            names::PLAYER_TEAM_FK,
        )
    }

    fn check_map_row(&self, map: &Map) -> StoreResult<()> {
        constraints::check_map(map)?;
        unique(
            self.maps
                .values()
                .any(|m| m.id != map.id && m.name == map.name),
            names::MAP_NAME_UNIQUE,
        )
    }

    fn check_map_pool_row(&self, entry: &MapPoolEntry) -> StoreResult<()> {
        constraints::check_map_pool_entry(entry)?;
        foreign_key(self.maps.contains(entry.map_id), names::MAP_POOL_MAP_FK)
    }

    fn check_match_row(&self, row: &Match) -> StoreResult<()> {
        constraints::check_match(row)?;
        foreign_key(
            self.tournaments.contains(row.tournament_id),
            names::MATCH_TOURNAMENT_FK,
        )?;
        foreign_key(self.teams.contains(row.team1_id), names::MATCH_TEAM1_FK)?;
        foreign_key(self.teams.contains(row.team2_id), names::MATCH_TEAM2_FK)?;
        foreign_key(
            row.winner_team_id.is_none_or(|w| self.teams.contains(w)),
            names::MATCH_WINNER_FK,
        )?;
        foreign_key(
            row.map_id.is_none_or(|m| self.maps.contains(m)),
            names::MATCH_MAP_FK,
        )
    }

    fn check_result_row(&self, result: &TournamentResult) -> StoreResult<()> {
        constraints::check_tournament_result(result)?;
        let same_event: Vec<&TournamentResult> = self
            .results
            .values()
            .filter(|r| r.id != result.id && r.tournament_id == result.tournament_id)
            .collect();
        unique(
            same_event.iter().any(|r| r.team_id == result.team_id),
            names::RESULT_TEAM_UNIQUE,
        )?;
        unique(
            same_event.iter().any(|r| r.placement == result.placement),
            names::RESULT_PLACEMENT_UNIQUE,
        )?;
        foreign_key(
            self.tournaments.contains(result.tournament_id),
            names::RESULT_TOURNAMENT_FK,
        )?;
        foreign_key(self.teams.contains(result.team_id), names::RESULT_TEAM_FK)
    }

    fn check_roster_row(&self, entry: &RosterEntry) -> StoreResult<()> {
        constraints::check_roster_entry(entry)?;
        unique(
            self.roster.values().any(|r| {
                r.id != entry.id && r.team_id == entry.team_id && r.player_id == entry.player_id
            }),
            names::ROSTER_MEMBER_UNIQUE,
        )?;
        foreign_key(self.teams.contains(entry.team_id), names::ROSTER_TEAM_FK)?;
        foreign_key(
            self.players.contains(entry.player_id),
            names::ROSTER_PLAYER_FK,
        )
    }

    fn active_roster(&self, team: TeamId, excluding: Option<RosterEntryId>) -> usize {
        self.roster
            .values()
            .filter(|r| r.team_id == team && r.is_active && Some(r.id) != excluding)
            .count()
    }

    fn snapshot(&self) -> LeagueSnapshot {
        LeagueSnapshot {
            teams: self.teams.list(),
            players: self.players.list(),
            tournaments: self.tournaments.list(),
            maps: self.maps.list(),
            map_pool: self.map_pool.list(),
            matches: self.matches.list(),
            results: self.results.list(),
            roster: self.roster.list(),
        }
    }
}

/// Entity store kept entirely in process memory
///
/// Enforces the same constraints, cascades and per-team roster
/// serialization as the PostgreSQL schema, reporting violations under the
/// same constraint names.
#[derive(Clone, Default)]
pub struct MemoryEntityStore {
    tables: Arc<RwLock<Tables>>,
    team_locks: Arc<Mutex<HashMap<TeamId, Arc<Mutex<()>>>>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn team_lock(&self, team: TeamId) -> Arc<Mutex<()>> {
        let mut locks = self.team_locks.lock().await;
        Arc::clone(locks.entry(team).or_default())
    }

    async fn lock_team(&self, team: TeamId) -> StoreResult<OwnedMutexGuard<()>> {
        let lock = self.team_lock(team).await;
        tokio::time::timeout(DEFAULT_TRANSACTION_TIMEOUT, lock.lock_owned())
            .await
            .map_err(|_| StoreError::Timeout(DEFAULT_TRANSACTION_TIMEOUT))
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn create_team(&self, team: &NewTeam) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        let row = Team {
            id: tables.teams.next_id(),
            name: team.name.clone(),
            region: team.region.clone(),
            founded_year: team.founded_year,
        };
        tables.check_team_row(&row)?;
        tables.teams.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.tables.read().await.teams.get(id))
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.tables.read().await.teams.list())
    }

    async fn update_team(&self, id: TeamId, update: &TeamUpdate) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .teams
            .get(id)
            .ok_or_else(|| StoreError::not_found("Team", id))?;
        update.apply(&mut row);
        tables.check_team_row(&row)?;
        tables.teams.put(id, row.clone());
        Ok(row)
    }

    async fn delete_team(&self, id: TeamId) -> StoreResult<bool> {
        let _team_guard = self.lock_team(id).await?;
        let mut tables = self.tables.write().await;
        if !tables.teams.contains(id) {
            return Ok(false);
        }

        if tables.matches.values().any(|m| m.team1_id == id) {
            return Err(StoreError::violation(
                ConstraintKind::ForeignKey,
                names::MATCH_TEAM1_FK,
            ));
        }
        if tables.matches.values().any(|m| m.team2_id == id) {
            return Err(StoreError::violation(
                ConstraintKind::ForeignKey,
                names::MATCH_TEAM2_FK,
            ));
        }

        for player in tables.players.rows.values_mut() {
            if player.team_id == Some(id) {
                player.team_id = None;
            }
        }
        tables.roster.rows.retain(|_, r| r.team_id != id);
        tables.results.rows.retain(|_, r| r.team_id != id);
        tables.teams.remove(id);
        drop(tables);

        self.team_locks.lock().await.remove(&id);
        Ok(true)
    }

    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let mut tables = self.tables.write().await;
        let row = Player {
            id: tables.players.next_id(),
            name: player.name.clone(),
            country: player.country.clone(),
            role: player.role.clone(),
            team_id: player.team_id,
        };
        tables.check_player_row(&row)?;
        tables.players.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.tables.read().await.players.get(id))
    }

    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        Ok(self.tables.read().await.players.list())
    }

    async fn update_player(&self, id: PlayerId, update: &PlayerUpdate) -> StoreResult<Player> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .players
            .get(id)
            .ok_or_else(|| StoreError::not_found("Player", id))?;
        update.apply(&mut row);
        tables.check_player_row(&row)?;
        tables.players.put(id, row.clone());
        Ok(row)
    }

    async fn delete_player(&self, id: PlayerId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.players.remove(id) {
            return Ok(false);
        }
        tables.roster.rows.retain(|_, r| r.player_id != id);
        Ok(true)
    }

    async fn create_tournament(&self, tournament: &NewTournament) -> StoreResult<Tournament> {
        let mut tables = self.tables.write().await;
        let row = Tournament {
            id: tables.tournaments.next_id(),
            name: tournament.name.clone(),
            organizer: tournament.organizer.clone(),
            prize_pool: tournament.prize_pool,
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            location: tournament.location.clone(),
        };
        constraints::check_tournament(&row)?;
        tables.tournaments.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.tables.read().await.tournaments.get(id))
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        Ok(self.tables.read().await.tournaments.list())
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> StoreResult<Tournament> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .tournaments
            .get(id)
            .ok_or_else(|| StoreError::not_found("Tournament", id))?;
        update.apply(&mut row);
        constraints::check_tournament(&row)?;
        tables.tournaments.put(id, row.clone());
        Ok(row)
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.tournaments.remove(id) {
            return Ok(false);
        }
        tables.matches.rows.retain(|_, m| m.tournament_id != id);
        tables.results.rows.retain(|_, r| r.tournament_id != id);
        Ok(true)
    }

    async fn create_map(&self, map: &NewMap) -> StoreResult<Map> {
        let mut tables = self.tables.write().await;
        let row = Map {
            id: tables.maps.next_id(),
            name: map.name.clone(),
        };
        tables.check_map_row(&row)?;
        tables.maps.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_map(&self, id: MapId) -> StoreResult<Option<Map>> {
        Ok(self.tables.read().await.maps.get(id))
    }

    async fn list_maps(&self) -> StoreResult<Vec<Map>> {
        Ok(self.tables.read().await.maps.list())
    }

    async fn update_map(&self, id: MapId, update: &MapUpdate) -> StoreResult<Map> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .maps
            .get(id)
            .ok_or_else(|| StoreError::not_found("Map", id))?;
        update.apply(&mut row);
        tables.check_map_row(&row)?;
        tables.maps.put(id, row.clone());
        Ok(row)
    }

    async fn delete_map(&self, id: MapId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.maps.remove(id) {
            return Ok(false);
        }
        tables.map_pool.rows.retain(|_, e| e.map_id != id);
        tables.matches.rows.retain(|_, m| m.map_id != Some(id));
        Ok(true)
    }

    async fn create_map_pool_entry(&self, entry: &NewMapPoolEntry) -> StoreResult<MapPoolEntry> {
        let mut tables = self.tables.write().await;
        let row = MapPoolEntry {
            id: tables.map_pool.next_id(),
            map_id: entry.map_id,
            status: entry.status,
            valid_from: entry.valid_from,
            valid_to: entry.valid_to,
        };
        tables.check_map_pool_row(&row)?;
        tables.map_pool.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<Option<MapPoolEntry>> {
        Ok(self.tables.read().await.map_pool.get(id))
    }

    async fn list_map_pool_entries(&self, map: Option<MapId>) -> StoreResult<Vec<MapPoolEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .map_pool
            .list_where(|e| map.is_none_or(|m| e.map_id == m)))
    }

    async fn update_map_pool_entry(
        &self,
        id: MapPoolEntryId,
        update: &MapPoolEntryUpdate,
    ) -> StoreResult<MapPoolEntry> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .map_pool
            .get(id)
            .ok_or_else(|| StoreError::not_found("MapPoolEntry", id))?;
        update.apply(&mut row);
        tables.check_map_pool_row(&row)?;
        tables.map_pool.put(id, row.clone());
        Ok(row)
    }

    async fn delete_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<bool> {
        Ok(self.tables.write().await.map_pool.remove(id))
    }

    async fn insert_match(&self, validated: &ValidatedMatch) -> StoreResult<Match> {
        let mut tables = self.tables.write().await;
        let row = validated.to_match(tables.matches.next_id());
        tables.check_match_row(&row)?;
        tables.matches.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.tables.read().await.matches.get(id))
    }

    async fn list_matches(&self, tournament: Option<TournamentId>) -> StoreResult<Vec<Match>> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .list_where(|m| tournament.is_none_or(|t| m.tournament_id == t)))
    }

    async fn replace_match(&self, id: MatchId, validated: &ValidatedMatch) -> StoreResult<Match> {
        let mut tables = self.tables.write().await;
        if !tables.matches.contains(id) {
            return Err(StoreError::not_found("Match", id));
        }
        let row = validated.to_match(id);
        tables.check_match_row(&row)?;
        tables.matches.put(id, row.clone());
        Ok(row)
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        Ok(self.tables.write().await.matches.remove(id))
    }

    async fn create_tournament_result(
        &self,
        result: &NewTournamentResult,
    ) -> StoreResult<TournamentResult> {
        let mut tables = self.tables.write().await;
        let row = TournamentResult {
            id: tables.results.next_id(),
            tournament_id: result.tournament_id,
            team_id: result.team_id,
            placement: result.placement,
            earnings: result.earnings,
        };
        tables.check_result_row(&row)?;
        tables.results.put(row.id, row.clone());
        Ok(row)
    }

    async fn get_tournament_result(
        &self,
        id: TournamentResultId,
    ) -> StoreResult<Option<TournamentResult>> {
        Ok(self.tables.read().await.results.get(id))
    }

    async fn list_tournament_results(
        &self,
        tournament: Option<TournamentId>,
    ) -> StoreResult<Vec<TournamentResult>> {
        let tables = self.tables.read().await;
        Ok(tables
            .results
            .list_where(|r| tournament.is_none_or(|t| r.tournament_id == t)))
    }

    async fn update_tournament_result(
        &self,
        id: TournamentResultId,
        update: &TournamentResultUpdate,
    ) -> StoreResult<TournamentResult> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .results
            .get(id)
            .ok_or_else(|| StoreError::not_found("TournamentResult", id))?;
        update.apply(&mut row);
        tables.check_result_row(&row)?;
        tables.results.put(id, row.clone());
        Ok(row)
    }

    async fn delete_tournament_result(&self, id: TournamentResultId) -> StoreResult<bool> {
        Ok(self.tables.write().await.results.remove(id))
    }

    async fn roster_scope(&self, team: TeamId) -> StoreResult<Box<dyn RosterScope>> {
        let guard = self.lock_team(team).await?;
        if !self.tables.read().await.teams.contains(team) {
            return Err(StoreError::not_found("Team", team));
        }
        debug!("Locked roster of team {team}");
        Ok(Box::new(MemoryRosterScope {
            tables: Arc::clone(&self.tables),
            team_id: team,
            _guard: guard,
        }))
    }

    async fn get_roster_entry(&self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>> {
        Ok(self.tables.read().await.roster.get(id))
    }

    async fn list_roster_entries(&self, team: Option<TeamId>) -> StoreResult<Vec<RosterEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roster
            .list_where(|r| team.is_none_or(|t| r.team_id == t)))
    }

    async fn update_roster_dates(
        &self,
        id: RosterEntryId,
        update: &RosterEntryUpdate,
    ) -> StoreResult<RosterEntry> {
        let mut tables = self.tables.write().await;
        let mut row = tables
            .roster
            .get(id)
            .ok_or_else(|| StoreError::not_found("RosterEntry", id))?;
        update.apply(&mut row);
        tables.check_roster_row(&row)?;
        tables.roster.put(id, row.clone());
        Ok(row)
    }

    async fn delete_roster_entry(&self, id: RosterEntryId) -> StoreResult<bool> {
        Ok(self.tables.write().await.roster.remove(id))
    }

    async fn snapshot(&self) -> StoreResult<LeagueSnapshot> {
        Ok(self.tables.read().await.snapshot())
    }
}

struct MemoryRosterScope {
    tables: Arc<RwLock<Tables>>,
    team_id: TeamId,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl RosterScope for MemoryRosterScope {
    fn team_id(&self) -> TeamId {
        self.team_id
    }

    async fn active_count(&mut self, excluding: Option<RosterEntryId>) -> StoreResult<usize> {
        Ok(self
            .tables
            .read()
            .await
            .active_roster(self.team_id, excluding))
    }

    async fn get_entry(&mut self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>> {
        Ok(self.tables.read().await.roster.get(id))
    }

    async fn insert_entry(&mut self, entry: &NewRosterEntry) -> StoreResult<RosterEntry> {
        check_scope_team(self.team_id, entry.team_id)?;
        let mut tables = self.tables.write().await;
        if entry.is_active {
            check_roster_room(self.team_id, tables.active_roster(self.team_id, None))?;
        }
        let row = RosterEntry {
            id: tables.roster.next_id(),
            team_id: entry.team_id,
            player_id: entry.player_id,
            is_active: entry.is_active,
            start_date: entry.start_date,
            end_date: entry.end_date,
        };
        tables.check_roster_row(&row)?;
        tables.roster.put(row.id, row.clone());
        Ok(row)
    }

    async fn set_active(&mut self, id: RosterEntryId, active: bool) -> StoreResult<RosterEntry> {
        let mut tables = self.tables.write().await;
        let current = tables
            .roster
            .get(id)
            .ok_or_else(|| StoreError::not_found("RosterEntry", id))?;
        check_scope_team(self.team_id, current.team_id)?;
        if active && !current.is_active {
            check_roster_room(self.team_id, tables.active_roster(self.team_id, Some(id)))?;
        }

        let row = RosterEntry {
            is_active: active,
            ..current
        };
        tables.roster.put(id, row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        debug!("Released roster of team {}", self.team_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{MatchRequest, validate_match};

    async fn two_teams(store: &MemoryEntityStore) -> (Team, Team) {
        let a = store.create_team(&NewTeam::new("Astralis", "EU")).await.unwrap();
        let b = store.create_team(&NewTeam::new("Liquid", "NA")).await.unwrap();
        (a, b)
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = MemoryEntityStore::new();
        let (a, b) = two_teams(&store).await;
        let map = store.create_map(&NewMap::new("Mirage")).await.unwrap();

        assert_eq!(a.id, TeamId(1));
        assert_eq!(b.id, TeamId(2));
        assert_eq!(map.id, MapId(1));
    }

    #[tokio::test]
    async fn test_duplicate_team_name_rejected() {
        let store = MemoryEntityStore::new();
        two_teams(&store).await;

        let err = store
            .create_team(&NewTeam::new("Astralis", "EU"))
            .await
            .unwrap_err();
        assert_eq!(err.constraint(), Some(names::TEAM_NAME_UNIQUE));
        assert_eq!(store.list_teams().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_not_a_conflict() {
        let store = MemoryEntityStore::new();
        let (a, _) = two_teams(&store).await;

        let update = TeamUpdate {
            name: Some("Astralis".to_string()),
            region: Some("Europe".to_string()),
            ..Default::default()
        };
        let updated = store.update_team(a.id, &update).await.unwrap();
        assert_eq!(updated.region, "Europe");
    }

    #[tokio::test]
    async fn test_team_in_match_cannot_be_deleted() {
        let store = MemoryEntityStore::new();
        let (a, b) = two_teams(&store).await;
        let event = store
            .create_tournament(&NewTournament::new("Major"))
            .await
            .unwrap();
        let validated = validate_match(MatchRequest::new(event.id, a.id, b.id)).unwrap();
        store.insert_match(&validated).await.unwrap();

        let err = store.delete_team(b.id).await.unwrap_err();
        assert_eq!(err.constraint(), Some(names::MATCH_TEAM2_FK));
        assert!(store.get_team(b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_roster_scope_requires_existing_team() {
        let store = MemoryEntityStore::new();
        let err = store.roster_scope(TeamId(42)).await.err().unwrap();
        assert!(matches!(err, StoreError::NotFound { entity: "Team", id: 42 }));
    }

    #[tokio::test]
    async fn test_roster_scope_excludes_entry_from_count() {
        let store = MemoryEntityStore::new();
        let (a, _) = two_teams(&store).await;
        let player = store.create_player(&NewPlayer::new("device")).await.unwrap();

        let mut scope = store.roster_scope(a.id).await.unwrap();
        let entry = scope
            .insert_entry(&NewRosterEntry::new(a.id, player.id))
            .await
            .unwrap();
        assert_eq!(scope.active_count(None).await.unwrap(), 1);
        assert_eq!(scope.active_count(Some(entry.id)).await.unwrap(), 0);
        scope.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_roster_scope_refuses_sixth_active_entry() {
        let store = MemoryEntityStore::new();
        let (a, _) = two_teams(&store).await;

        let mut scope = store.roster_scope(a.id).await.unwrap();
        for i in 0..6 {
            let player = store
                .create_player(&NewPlayer::new(format!("starter{i}")))
                .await
                .unwrap();
            let inserted = scope.insert_entry(&NewRosterEntry::new(a.id, player.id)).await;
            if i < 5 {
                inserted.unwrap();
            } else {
                assert!(matches!(
                    inserted,
                    Err(StoreError::RosterFull { limit: 5, team_id }) if team_id == a.id
                ));
            }
        }
        assert_eq!(scope.active_count(None).await.unwrap(), 5);
        scope.commit().await.unwrap();
        assert_eq!(store.list_roster_entries(Some(a.id)).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_roster_scope_refuses_activation_past_ceiling() {
        let store = MemoryEntityStore::new();
        let (a, _) = two_teams(&store).await;

        let mut scope = store.roster_scope(a.id).await.unwrap();
        let mut bench = None;
        for i in 0..6 {
            let player = store
                .create_player(&NewPlayer::new(format!("member{i}")))
                .await
                .unwrap();
            let entry = NewRosterEntry::new(a.id, player.id);
            let entry = if i == 5 { entry.inactive() } else { entry };
            bench = Some(scope.insert_entry(&entry).await.unwrap());
        }
        let bench = bench.unwrap();

        let err = scope.set_active(bench.id, true).await.unwrap_err();
        assert!(matches!(err, StoreError::RosterFull { .. }));
        assert!(!scope.get_entry(bench.id).await.unwrap().unwrap().is_active);

        // Reasserting an already active entry does not count it twice
        let starter = store.list_roster_entries(Some(a.id)).await.unwrap()[0].clone();
        assert!(scope.set_active(starter.id, true).await.unwrap().is_active);
        scope.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_roster_scope_only_writes_its_own_team() {
        let store = MemoryEntityStore::new();
        let (a, b) = two_teams(&store).await;
        let player = store.create_player(&NewPlayer::new("ropz")).await.unwrap();

        let mut scope_b = store.roster_scope(b.id).await.unwrap();
        let entry = scope_b
            .insert_entry(&NewRosterEntry::new(b.id, player.id).inactive())
            .await
            .unwrap();
        scope_b.commit().await.unwrap();

        let mut scope_a = store.roster_scope(a.id).await.unwrap();
        let err = scope_a
            .insert_entry(&NewRosterEntry::new(b.id, player.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OutsideRosterScope { .. }));
        let err = scope_a.set_active(entry.id, true).await.unwrap_err();
        assert!(matches!(err, StoreError::OutsideRosterScope { .. }));
        scope_a.commit().await.unwrap();

        let stored = store.get_roster_entry(entry.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }
}
