//! Column-level constraints shared by every backend.
//!
//! PostgreSQL enforces these through the DDL in [`crate::db::schema`]; the
//! in-memory store calls the `check_*` functions on the fully merged row
//! before writing it. Constraint names are identical in both places so that
//! callers see the same `ConstraintViolation` regardless of backend.

use super::errors::{ConstraintKind, StoreError, StoreResult};
use crate::entities::{
    Map, MapPoolEntry, Match, Player, RosterEntry, Team, Tournament, TournamentResult,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub mod names {
    pub const TEAM_NAME_UNIQUE: &str = "teams_team_name_key";
    pub const TEAM_NAME_CHK: &str = "team_name_chk";
    pub const TEAM_REGION_CHK: &str = "team_region_chk";

    pub const PLAYER_NAME_CHK: &str = "player_name_chk";
    pub const PLAYER_TEAM_FK: &str = "players_team_id_fkey";

    pub const TOURNAMENT_NAME_CHK: &str = "tournament_name_chk";
    pub const TOURNAMENT_PRIZE_POOL_CHK: &str = "tournament_prize_pool_chk";
    pub const TOURNAMENT_DATES_CHK: &str = "tournament_dates_chk";

    pub const MAP_NAME_UNIQUE: &str = "maps_map_name_key";
    pub const MAP_NAME_CHK: &str = "map_name_chk";

    pub const MAP_POOL_MAP_FK: &str = "map_pool_map_id_fkey";
    pub const MAP_POOL_DATES_CHK: &str = "map_pool_dates_chk";

    pub const MATCH_TOURNAMENT_FK: &str = "matches_tournament_id_fkey";
    pub const MATCH_TEAM1_FK: &str = "matches_team1_id_fkey";
    pub const MATCH_TEAM2_FK: &str = "matches_team2_id_fkey";
    pub const MATCH_WINNER_FK: &str = "matches_winner_team_id_fkey";
    pub const MATCH_MAP_FK: &str = "matches_map_id_fkey";
    pub const MATCH_BEST_OF_CHK: &str = "best_of_chk";
    pub const MATCH_SCORES_CHK: &str = "scores_chk";
    pub const MATCH_DIFFERENT_TEAMS_CHK: &str = "different_teams_chk";
    pub const MATCH_WINNER_VALID_CHK: &str = "winner_valid_chk";

    pub const RESULT_TOURNAMENT_FK: &str = "tournament_results_tournament_id_fkey";
    pub const RESULT_TEAM_FK: &str = "tournament_results_team_id_fkey";
    pub const RESULT_TEAM_UNIQUE: &str = "tournament_results_tournament_id_team_id_key";
    pub const RESULT_PLACEMENT_UNIQUE: &str = "tournament_results_tournament_id_placement_key";
    pub const RESULT_PLACEMENT_CHK: &str = "placement_chk";
    pub const RESULT_EARNINGS_CHK: &str = "earnings_chk";

    pub const ROSTER_TEAM_FK: &str = "team_roster_team_id_fkey";
    pub const ROSTER_PLAYER_FK: &str = "team_roster_player_id_fkey";
    pub const ROSTER_MEMBER_UNIQUE: &str = "team_roster_team_id_player_id_key";
    pub const ROSTER_DATES_CHK: &str = "roster_dates_chk";

    /// Every constraint name, for cross-checking against the DDL
    pub const ALL: &[&str] = &[
        TEAM_NAME_UNIQUE,
        TEAM_NAME_CHK,
        TEAM_REGION_CHK,
        PLAYER_NAME_CHK,
        PLAYER_TEAM_FK,
        TOURNAMENT_NAME_CHK,
        TOURNAMENT_PRIZE_POOL_CHK,
        TOURNAMENT_DATES_CHK,
        MAP_NAME_UNIQUE,
        MAP_NAME_CHK,
        MAP_POOL_MAP_FK,
        MAP_POOL_DATES_CHK,
        MATCH_TOURNAMENT_FK,
        MATCH_TEAM1_FK,
        MATCH_TEAM2_FK,
        MATCH_WINNER_FK,
        MATCH_MAP_FK,
        MATCH_BEST_OF_CHK,
        MATCH_SCORES_CHK,
        MATCH_DIFFERENT_TEAMS_CHK,
        MATCH_WINNER_VALID_CHK,
        RESULT_TOURNAMENT_FK,
        RESULT_TEAM_FK,
        RESULT_TEAM_UNIQUE,
        RESULT_PLACEMENT_UNIQUE,
        RESULT_PLACEMENT_CHK,
        RESULT_EARNINGS_CHK,
        ROSTER_TEAM_FK,
        ROSTER_PLAYER_FK,
        ROSTER_MEMBER_UNIQUE,
        ROSTER_DATES_CHK,
    ];
}

fn check(ok: bool, constraint: &'static str) -> StoreResult<()> {
    if ok {
        Ok(())
    } else {
        Err(StoreError::violation(ConstraintKind::Check, constraint))
    }
}

fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

fn ordered(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    }
}

pub fn check_team(team: &Team) -> StoreResult<()> {
    check(not_blank(&team.name), names::TEAM_NAME_CHK)?;
    check(not_blank(&team.region), names::TEAM_REGION_CHK)
}

pub fn check_player(player: &Player) -> StoreResult<()> {
    check(not_blank(&player.name), names::PLAYER_NAME_CHK)
}

pub fn check_tournament(tournament: &Tournament) -> StoreResult<()> {
    check(not_blank(&tournament.name), names::TOURNAMENT_NAME_CHK)?;
    check(
        tournament.prize_pool >= Decimal::ZERO,
        names::TOURNAMENT_PRIZE_POOL_CHK,
    )?;
    check(
        ordered(tournament.start_date, tournament.end_date),
        names::TOURNAMENT_DATES_CHK,
    )
}

pub fn check_map(map: &Map) -> StoreResult<()> {
    check(not_blank(&map.name), names::MAP_NAME_CHK)
}

pub fn check_map_pool_entry(entry: &MapPoolEntry) -> StoreResult<()> {
    check(
        ordered(Some(entry.valid_from), entry.valid_to),
        names::MAP_POOL_DATES_CHK,
    )
}

/// Row-level checks on a match. The validator rejects all of these earlier
/// with a more specific error; they remain here because the DDL has them too.
pub fn check_match(row: &Match) -> StoreResult<()> {
    check(row.best_of > 0, names::MATCH_BEST_OF_CHK)?;
    check(
        row.team1_score.is_none_or(|s| s >= 0) && row.team2_score.is_none_or(|s| s >= 0),
        names::MATCH_SCORES_CHK,
    )?;
    check(
        row.team1_id != row.team2_id,
        names::MATCH_DIFFERENT_TEAMS_CHK,
    )?;
    check(
        row.winner_team_id.is_none_or(|w| row.involves(w)),
        names::MATCH_WINNER_VALID_CHK,
    )
}

pub fn check_tournament_result(result: &TournamentResult) -> StoreResult<()> {
    check(result.placement > 0, names::RESULT_PLACEMENT_CHK)?;
    check(result.earnings >= Decimal::ZERO, names::RESULT_EARNINGS_CHK)
}

pub fn check_roster_entry(entry: &RosterEntry) -> StoreResult<()> {
    check(
        ordered(entry.start_date, entry.end_date),
        names::ROSTER_DATES_CHK,
    )
}
