//! Row counts and readable match lines.

use crate::entities::{MatchId, TeamId};
use crate::store::LeagueSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rows per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub teams: usize,
    pub players: usize,
    pub tournaments: usize,
    pub maps: usize,
    pub map_pool: usize,
    pub matches: usize,
    pub tournament_results: usize,
    pub roster_entries: usize,
}

impl EntityCounts {
    /// `(table, count)` pairs in display order
    pub fn as_pairs(&self) -> [(&'static str, usize); 8] {
        [
            ("teams", self.teams),
            ("players", self.players),
            ("tournaments", self.tournaments),
            ("maps", self.maps),
            ("map_pool", self.map_pool),
            ("matches", self.matches),
            ("tournament_results", self.tournament_results),
            ("team_roster", self.roster_entries),
        ]
    }
}

pub fn entity_counts(snapshot: &LeagueSnapshot) -> EntityCounts {
    EntityCounts {
        teams: snapshot.teams.len(),
        players: snapshot.players.len(),
        tournaments: snapshot.tournaments.len(),
        maps: snapshot.maps.len(),
        map_pool: snapshot.map_pool.len(),
        matches: snapshot.matches.len(),
        tournament_results: snapshot.results.len(),
        roster_entries: snapshot.roster.len(),
    }
}

/// A match with names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLine {
    pub match_id: MatchId,
    pub tournament: String,
    pub team1: String,
    pub team2: String,
    /// `None` while undecided
    pub winner: Option<String>,
    pub map: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub best_of: i32,
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
}

/// Matches ordered by date (undated last), then id, truncated to `limit`
pub fn match_lines(snapshot: &LeagueSnapshot, limit: Option<usize>) -> Vec<MatchLine> {
    let teams: HashMap<TeamId, &str> = snapshot
        .teams
        .iter()
        .map(|t| (t.id, t.name.as_str()))
        .collect();
    let team_name = |id: TeamId| teams.get(&id).map_or_else(|| id.to_string(), |n| n.to_string());

    let mut matches: Vec<_> = snapshot.matches.iter().collect();
    matches.sort_by_key(|m| (m.match_date.is_none(), m.match_date, m.id));

    matches
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|m| MatchLine {
            match_id: m.id,
            tournament: snapshot
                .tournaments
                .iter()
                .find(|t| t.id == m.tournament_id)
                .map_or_else(|| m.tournament_id.to_string(), |t| t.name.clone()),
            team1: team_name(m.team1_id),
            team2: team_name(m.team2_id),
            winner: m.winner_team_id.map(team_name),
            map: m
                .map_id
                .and_then(|id| snapshot.maps.iter().find(|map| map.id == id))
                .map(|map| map.name.clone()),
            match_date: m.match_date,
            best_of: m.best_of,
            team1_score: m.team1_score,
            team2_score: m.team2_score,
        })
        .collect()
}
