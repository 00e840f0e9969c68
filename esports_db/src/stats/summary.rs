//! Per-team folds over matches, results and rosters.

use crate::entities::{MapId, TeamId};
use crate::store::LeagueSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Performance summary of one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: TeamId,
    pub team_name: String,
    /// Matches where the team is either side
    pub matches_played: u64,
    /// Matches where the team is the declared winner
    pub wins: u64,
    /// Sum of tournament result earnings
    pub total_earnings: Decimal,
}

/// One row per team ordered by name, including teams with no matches or
/// results.
pub fn team_summary(snapshot: &LeagueSnapshot) -> Vec<TeamSummary> {
    let mut played: HashMap<TeamId, u64> = HashMap::new();
    let mut wins: HashMap<TeamId, u64> = HashMap::new();
    for m in &snapshot.matches {
        *played.entry(m.team1_id).or_default() += 1;
        *played.entry(m.team2_id).or_default() += 1;
        if let Some(winner) = m.winner_team_id {
            *wins.entry(winner).or_default() += 1;
        }
    }

    let earnings = earnings_per_team(snapshot);

    let mut summary: Vec<TeamSummary> = snapshot
        .teams
        .iter()
        .map(|team| TeamSummary {
            team_id: team.id,
            team_name: team.name.clone(),
            matches_played: played.get(&team.id).copied().unwrap_or(0),
            wins: wins.get(&team.id).copied().unwrap_or(0),
            total_earnings: earnings.get(&team.id).copied().unwrap_or(Decimal::ZERO),
        })
        .collect();

    summary.sort_by(|a, b| a.team_name.cmp(&b.team_name));
    summary
}

fn earnings_per_team(snapshot: &LeagueSnapshot) -> HashMap<TeamId, Decimal> {
    let mut earnings: HashMap<TeamId, Decimal> = HashMap::new();
    for result in &snapshot.results {
        *earnings.entry(result.team_id).or_default() += result.earnings;
    }
    earnings
}

/// Total prize money of a team with at least one tournament result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEarnings {
    pub team_id: TeamId,
    pub team_name: String,
    pub total_earnings: Decimal,
}

/// Teams with results, highest total first (ties by name)
pub fn earnings_by_team(snapshot: &LeagueSnapshot) -> Vec<TeamEarnings> {
    let earnings = earnings_per_team(snapshot);

    let mut rows: Vec<TeamEarnings> = snapshot
        .teams
        .iter()
        .filter_map(|team| {
            earnings.get(&team.id).map(|total| TeamEarnings {
                team_id: team.id,
                team_name: team.name.clone(),
                total_earnings: *total,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_earnings
            .cmp(&a.total_earnings)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    rows
}

/// Decided matches played on one map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapWins {
    pub map_id: MapId,
    pub map_name: String,
    pub decided_matches: u64,
}

/// Maps with at least one decided match, most first (ties by name)
pub fn wins_by_map(snapshot: &LeagueSnapshot) -> Vec<MapWins> {
    let mut decided: HashMap<MapId, u64> = HashMap::new();
    for m in &snapshot.matches {
        if let (Some(map_id), Some(_)) = (m.map_id, m.winner_team_id) {
            *decided.entry(map_id).or_default() += 1;
        }
    }

    let mut rows: Vec<MapWins> = snapshot
        .maps
        .iter()
        .filter_map(|map| {
            decided.get(&map.id).map(|count| MapWins {
                map_id: map.id,
                map_name: map.name.clone(),
                decided_matches: *count,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.decided_matches
            .cmp(&a.decided_matches)
            .then_with(|| a.map_name.cmp(&b.map_name))
    });
    rows
}

/// Active roster size of one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRoster {
    pub team_id: TeamId,
    pub team_name: String,
    pub active_players: u64,
}

/// Every team with its active roster size, ordered by name
pub fn active_roster_counts(snapshot: &LeagueSnapshot) -> Vec<ActiveRoster> {
    let mut active: HashMap<TeamId, u64> = HashMap::new();
    for entry in snapshot.roster.iter().filter(|r| r.is_active) {
        *active.entry(entry.team_id).or_default() += 1;
    }

    let mut rows: Vec<ActiveRoster> = snapshot
        .teams
        .iter()
        .map(|team| ActiveRoster {
            team_id: team.id,
            team_name: team.name.clone(),
            active_players: active.get(&team.id).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| a.team_name.cmp(&b.team_name));
    rows
}
