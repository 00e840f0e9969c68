//! Score/winner consistency checks and the validated write path for matches.

use crate::entities::{MapId, Match, MatchId, MatchUpdate, TeamId, TournamentId};
use crate::store::{EntityStore, StoreError};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Reasons a match request is rejected, in the order they are checked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Team {0} cannot play against itself")]
    DuplicateTeams(TeamId),

    #[error("Best-of must be a positive number, got {0:?}")]
    InvalidBestOf(Option<i32>),

    #[error("Scores cannot be negative: {team1_score:?}-{team2_score:?}")]
    InvalidScore {
        team1_score: Option<i32>,
        team2_score: Option<i32>,
    },

    #[error("Winner {winner} is not one of the teams {team1} and {team2}")]
    InvalidWinner {
        winner: TeamId,
        team1: TeamId,
        team2: TeamId,
    },

    #[error("Both scores are required when a winner is declared")]
    MissingScore,

    #[error("Tied score {0}-{0} cannot have a winner")]
    TiedScore(i32),

    #[error("Declared winner {winner} scored {winner_score} against {opponent_score}")]
    WinnerScoreMismatch {
        winner: TeamId,
        winner_score: i32,
        opponent_score: i32,
    },
}

/// Unvalidated match input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub tournament_id: TournamentId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub winner_team_id: Option<TeamId>,
    pub map_id: Option<MapId>,
    pub match_date: Option<NaiveDate>,
    pub best_of: Option<i32>,
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
}

impl MatchRequest {
    /// Undecided best-of-1 between two teams with no scores yet
    pub fn new(tournament_id: TournamentId, team1_id: TeamId, team2_id: TeamId) -> Self {
        Self {
            tournament_id,
            team1_id,
            team2_id,
            winner_team_id: None,
            map_id: None,
            match_date: None,
            best_of: Some(1),
            team1_score: None,
            team2_score: None,
        }
    }

    pub fn best_of(mut self, best_of: i32) -> Self {
        self.best_of = Some(best_of);
        self
    }

    pub fn scores(mut self, team1_score: i32, team2_score: i32) -> Self {
        self.team1_score = Some(team1_score);
        self.team2_score = Some(team2_score);
        self
    }

    pub fn winner(mut self, winner: TeamId) -> Self {
        self.winner_team_id = Some(winner);
        self
    }

    pub fn on_map(mut self, map_id: MapId) -> Self {
        self.map_id = Some(map_id);
        self
    }

    pub fn played_on(mut self, date: NaiveDate) -> Self {
        self.match_date = Some(date);
        self
    }

    /// Request describing a stored match with `update` merged in
    pub fn from_stored(stored: &Match, update: &MatchUpdate) -> Self {
        Self {
            tournament_id: update.tournament_id.unwrap_or(stored.tournament_id),
            team1_id: update.team1_id.unwrap_or(stored.team1_id),
            team2_id: update.team2_id.unwrap_or(stored.team2_id),
            winner_team_id: update.winner_team_id.unwrap_or(stored.winner_team_id),
            map_id: update.map_id.unwrap_or(stored.map_id),
            match_date: update.match_date.unwrap_or(stored.match_date),
            best_of: Some(update.best_of.unwrap_or(stored.best_of)),
            team1_score: update.team1_score.unwrap_or(stored.team1_score),
            team2_score: update.team2_score.unwrap_or(stored.team2_score),
        }
    }
}

/// A match request that passed [`validate_match`]
///
/// This is the only input the entity store accepts for writing match rows,
/// and it can only be obtained from the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMatch {
    request: MatchRequest,
    best_of: i32,
}

impl ValidatedMatch {
    pub fn request(&self) -> &MatchRequest {
        &self.request
    }

    pub fn best_of(&self) -> i32 {
        self.best_of
    }

    /// Row representation under the given id
    pub fn to_match(&self, id: MatchId) -> Match {
        let r = &self.request;
        Match {
            id,
            tournament_id: r.tournament_id,
            team1_id: r.team1_id,
            team2_id: r.team2_id,
            winner_team_id: r.winner_team_id,
            map_id: r.map_id,
            match_date: r.match_date,
            best_of: self.best_of,
            team1_score: r.team1_score,
            team2_score: r.team2_score,
        }
    }
}

/// Check a match request for internal consistency.
///
/// Only the request itself is inspected. Whether the referenced tournament,
/// teams and map exist is left to the store's foreign keys. Best-of is not
/// reconciled with the score: a 1-0 winner in a best-of-3 is accepted.
pub fn validate_match(request: MatchRequest) -> Result<ValidatedMatch, ValidationError> {
    if request.team1_id == request.team2_id {
        return Err(ValidationError::DuplicateTeams(request.team1_id));
    }

    let best_of = match request.best_of {
        Some(n) if n > 0 => n,
        other => return Err(ValidationError::InvalidBestOf(other)),
    };

    if request.team1_score.is_some_and(|s| s < 0) || request.team2_score.is_some_and(|s| s < 0) {
        return Err(ValidationError::InvalidScore {
            team1_score: request.team1_score,
            team2_score: request.team2_score,
        });
    }

    if let Some(winner) = request.winner_team_id {
        if winner != request.team1_id && winner != request.team2_id {
            return Err(ValidationError::InvalidWinner {
                winner,
                team1: request.team1_id,
                team2: request.team2_id,
            });
        }

        let (Some(team1_score), Some(team2_score)) = (request.team1_score, request.team2_score)
        else {
            return Err(ValidationError::MissingScore);
        };

        if team1_score == team2_score {
            return Err(ValidationError::TiedScore(team1_score));
        }

        let (winner_score, opponent_score) = if winner == request.team1_id {
            (team1_score, team2_score)
        } else {
            (team2_score, team1_score)
        };
        if winner_score <= opponent_score {
            return Err(ValidationError::WinnerScoreMismatch {
                winner,
                winner_score,
                opponent_score,
            });
        }
    }

    Ok(ValidatedMatch { request, best_of })
}

/// Match write errors
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Validated write path for match rows
#[derive(Clone)]
pub struct MatchValidator {
    store: Arc<dyn EntityStore>,
}

impl MatchValidator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new match
    ///
    /// # Errors
    ///
    /// * `MatchError::Validation` - the request is inconsistent; nothing is written
    /// * `MatchError::Store` - a referenced row is missing or the write failed
    pub async fn create_match(&self, request: MatchRequest) -> MatchResult<MatchId> {
        let validated = validate_match(request).inspect_err(|e| warn!("Rejected match: {e}"))?;
        let created = self.store.insert_match(&validated).await?;
        info!(
            "Created match {} ({} vs {}) in tournament {}",
            created.id, created.team1_id, created.team2_id, created.tournament_id
        );
        Ok(created.id)
    }

    /// Apply a partial update, re-validating the merged match
    pub async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> MatchResult<Match> {
        let stored = self
            .store
            .get_match(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Match", id))?;
        let validated = validate_match(MatchRequest::from_stored(&stored, update))
            .inspect_err(|e| warn!("Rejected update of match {id}: {e}"))?;
        Ok(self.store.replace_match(id, &validated).await?)
    }
}
