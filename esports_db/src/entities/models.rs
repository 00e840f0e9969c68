//! Stored entity rows, creation payloads and partial updates.
//!
//! Update structs follow one convention: `None` keeps the stored value. Fields
//! that are nullable in storage use `Option<Option<T>>` so that
//! `Some(None)` clears them.

use super::ids::{
    MapId, MapPoolEntryId, MatchId, PlayerId, RosterEntryId, TeamId, TournamentId,
    TournamentResultId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Team row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Unique, non-blank
    pub name: String,
    /// Non-blank
    pub region: String,
    pub founded_year: Option<i32>,
}

/// Payload for creating a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub region: String,
    pub founded_year: Option<i32>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            founded_year: None,
        }
    }

    /// Set the founding year
    pub fn founded(mut self, year: i32) -> Self {
        self.founded_year = Some(year);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub region: Option<String>,
    pub founded_year: Option<Option<i32>>,
}

impl TeamUpdate {
    pub fn apply(&self, team: &mut Team) {
        if let Some(name) = &self.name {
            team.name = name.clone();
        }
        if let Some(region) = &self.region {
            team.region = region.clone();
        }
        if let Some(founded_year) = self.founded_year {
            team.founded_year = founded_year;
        }
    }
}

/// Player row
///
/// `team_id` is a weak reference: deleting the team clears it and the player
/// becomes a free agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub country: Option<String>,
    pub role: Option<String>,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub country: Option<String>,
    pub role: Option<String>,
    pub team_id: Option<TeamId>,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            role: None,
            team_id: None,
        }
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sign the player to a team
    pub fn on_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub country: Option<Option<String>>,
    pub role: Option<Option<String>>,
    /// `Some(None)` releases the player to free agency
    pub team_id: Option<Option<TeamId>>,
}

impl PlayerUpdate {
    pub fn apply(&self, player: &mut Player) {
        if let Some(name) = &self.name {
            player.name = name.clone();
        }
        if let Some(country) = &self.country {
            player.country = country.clone();
        }
        if let Some(role) = &self.role {
            player.role = role.clone();
        }
        if let Some(team_id) = self.team_id {
            player.team_id = team_id;
        }
    }
}

/// Tournament row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub organizer: Option<String>,
    /// Never negative
    pub prize_pool: Decimal,
    pub start_date: Option<NaiveDate>,
    /// On or after `start_date` when both are set
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub organizer: Option<String>,
    pub prize_pool: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
}

impl NewTournament {
    /// Tournament with an empty prize pool and no schedule
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            organizer: None,
            prize_pool: Decimal::ZERO,
            start_date: None,
            end_date: None,
            location: None,
        }
    }

    pub fn organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    pub fn prize_pool(mut self, prize_pool: Decimal) -> Self {
        self.prize_pool = prize_pool;
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub organizer: Option<Option<String>>,
    pub prize_pool: Option<Decimal>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub location: Option<Option<String>>,
}

impl TournamentUpdate {
    pub fn apply(&self, tournament: &mut Tournament) {
        if let Some(name) = &self.name {
            tournament.name = name.clone();
        }
        if let Some(organizer) = &self.organizer {
            tournament.organizer = organizer.clone();
        }
        if let Some(prize_pool) = self.prize_pool {
            tournament.prize_pool = prize_pool;
        }
        if let Some(start_date) = self.start_date {
            tournament.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            tournament.end_date = end_date;
        }
        if let Some(location) = &self.location {
            tournament.location = location.clone();
        }
    }
}

/// Map row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub id: MapId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMap {
    pub name: String,
}

impl NewMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapUpdate {
    pub name: Option<String>,
}

impl MapUpdate {
    pub fn apply(&self, map: &mut Map) {
        if let Some(name) = &self.name {
            map.name = name.clone();
        }
    }
}

/// Competitive standing of a map during a validity interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPoolStatus {
    Active,
    Reserve,
    Retired,
}

impl MapPoolStatus {
    /// Storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            MapPoolStatus::Active => "active",
            MapPoolStatus::Reserve => "reserve",
            MapPoolStatus::Retired => "retired",
        }
    }
}

impl fmt::Display for MapPoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown map pool status: {0}")]
pub struct UnknownMapPoolStatus(pub String);

impl FromStr for MapPoolStatus {
    type Err = UnknownMapPoolStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MapPoolStatus::Active),
            "reserve" => Ok(MapPoolStatus::Reserve),
            "retired" => Ok(MapPoolStatus::Retired),
            other => Err(UnknownMapPoolStatus(other.to_string())),
        }
    }
}

/// One historical interval of a map's pool status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPoolEntry {
    pub id: MapPoolEntryId,
    pub map_id: MapId,
    pub status: MapPoolStatus,
    pub valid_from: NaiveDate,
    /// Open-ended when `None`
    pub valid_to: Option<NaiveDate>,
}

impl MapPoolEntry {
    /// Whether `date` falls inside the closed validity interval
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMapPoolEntry {
    pub map_id: MapId,
    pub status: MapPoolStatus,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
}

impl NewMapPoolEntry {
    pub fn new(map_id: MapId, status: MapPoolStatus, valid_from: NaiveDate) -> Self {
        Self {
            map_id,
            status,
            valid_from,
            valid_to: None,
        }
    }

    pub fn until(mut self, valid_to: NaiveDate) -> Self {
        self.valid_to = Some(valid_to);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPoolEntryUpdate {
    pub status: Option<MapPoolStatus>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<Option<NaiveDate>>,
}

impl MapPoolEntryUpdate {
    pub fn apply(&self, entry: &mut MapPoolEntry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(valid_from) = self.valid_from {
            entry.valid_from = valid_from;
        }
        if let Some(valid_to) = self.valid_to {
            entry.valid_to = valid_to;
        }
    }
}

/// Match row
///
/// Rows are only ever written from a validated request, see
/// [`crate::matches::ValidatedMatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub winner_team_id: Option<TeamId>,
    pub map_id: Option<MapId>,
    pub match_date: Option<NaiveDate>,
    pub best_of: i32,
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
}

impl Match {
    /// Whether the team took part in this match
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub tournament_id: Option<TournamentId>,
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
    pub winner_team_id: Option<Option<TeamId>>,
    pub map_id: Option<Option<MapId>>,
    pub match_date: Option<Option<NaiveDate>>,
    pub best_of: Option<i32>,
    pub team1_score: Option<Option<i32>>,
    pub team2_score: Option<Option<i32>>,
}

/// Final placement of a team in a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub id: TournamentResultId,
    pub tournament_id: TournamentId,
    pub team_id: TeamId,
    /// 1 is the winner; unique within a tournament
    pub placement: i32,
    pub earnings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournamentResult {
    pub tournament_id: TournamentId,
    pub team_id: TeamId,
    pub placement: i32,
    pub earnings: Decimal,
}

impl NewTournamentResult {
    pub fn new(tournament_id: TournamentId, team_id: TeamId, placement: i32) -> Self {
        Self {
            tournament_id,
            team_id,
            placement,
            earnings: Decimal::ZERO,
        }
    }

    pub fn earnings(mut self, earnings: Decimal) -> Self {
        self.earnings = earnings;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResultUpdate {
    pub tournament_id: Option<TournamentId>,
    pub team_id: Option<TeamId>,
    pub placement: Option<i32>,
    pub earnings: Option<Decimal>,
}

impl TournamentResultUpdate {
    pub fn apply(&self, result: &mut TournamentResult) {
        if let Some(tournament_id) = self.tournament_id {
            result.tournament_id = tournament_id;
        }
        if let Some(team_id) = self.team_id {
            result.team_id = team_id;
        }
        if let Some(placement) = self.placement {
            result.placement = placement;
        }
        if let Some(earnings) = self.earnings {
            result.earnings = earnings;
        }
    }
}

/// Membership of a player in a team's roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: RosterEntryId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    /// Counted toward the team's active roster ceiling
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRosterEntry {
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl NewRosterEntry {
    /// Active entry with no dates, matching the storage default
    pub fn new(team_id: TeamId, player_id: PlayerId) -> Self {
        Self {
            team_id,
            player_id,
            is_active: true,
            start_date: None,
            end_date: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// Date changes for a roster entry
///
/// The active flag is deliberately absent: it only changes through the
/// roster guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntryUpdate {
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl RosterEntryUpdate {
    pub fn apply(&self, entry: &mut RosterEntry) {
        if let Some(start_date) = self.start_date {
            entry.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            entry.end_date = end_date;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_map_pool_status_round_trips_through_storage_text() {
        for status in [
            MapPoolStatus::Active,
            MapPoolStatus::Reserve,
            MapPoolStatus::Retired,
        ] {
            assert_eq!(status.as_str().parse::<MapPoolStatus>(), Ok(status));
        }
        assert!("banned".parse::<MapPoolStatus>().is_err());
    }

    #[test]
    fn test_map_pool_entry_covers_closed_interval() {
        let entry = MapPoolEntry {
            id: MapPoolEntryId(1),
            map_id: MapId(1),
            status: MapPoolStatus::Retired,
            valid_from: date(2023, 9, 27),
            valid_to: Some(date(2025, 2, 1)),
        };

        assert!(entry.covers(date(2023, 9, 27)));
        assert!(entry.covers(date(2024, 1, 1)));
        assert!(entry.covers(date(2025, 2, 1)));
        assert!(!entry.covers(date(2023, 9, 26)));
        assert!(!entry.covers(date(2025, 3, 1)));
    }

    #[test]
    fn test_map_pool_entry_open_ended() {
        let entry = MapPoolEntry {
            id: MapPoolEntryId(1),
            map_id: MapId(1),
            status: MapPoolStatus::Active,
            valid_from: date(2020, 1, 1),
            valid_to: None,
        };
        assert!(entry.covers(date(2099, 12, 31)));
    }

    #[test]
    fn test_player_update_releases_to_free_agency() {
        let mut player = Player {
            id: PlayerId(1),
            name: "s1mple".to_string(),
            country: Some("Ukraine".to_string()),
            role: Some("AWPer".to_string()),
            team_id: Some(TeamId(3)),
        };

        PlayerUpdate {
            team_id: Some(None),
            ..Default::default()
        }
        .apply(&mut player);

        assert_eq!(player.team_id, None);
        assert_eq!(player.role.as_deref(), Some("AWPer"));
    }

    #[test]
    fn test_empty_update_keeps_everything() {
        let original = Team {
            id: TeamId(1),
            name: "Vitality".to_string(),
            region: "EU".to_string(),
            founded_year: Some(2013),
        };
        let mut team = original.clone();
        TeamUpdate::default().apply(&mut team);
        assert_eq!(team, original);
    }
}
