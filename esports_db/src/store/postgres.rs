//! Entity store on PostgreSQL.
#![allow(clippy::needless_raw_string_hashes)]

use super::errors::{StoreError, StoreResult};
use super::{EntityStore, LeagueSnapshot, RosterScope, check_roster_room, check_scope_team};
use crate::db::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, LONG_OPERATION_TIMEOUT, with_timeout};
use crate::entities::{
    Map, MapId, MapPoolEntry, MapPoolEntryId, MapPoolEntryUpdate, MapPoolStatus, MapUpdate, Match,
    MatchId, NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament,
    NewTournamentResult, Player, PlayerId, PlayerUpdate, RosterEntry, RosterEntryId,
    RosterEntryUpdate, Team, TeamId, TeamUpdate, Tournament, TournamentId, TournamentResult,
    TournamentResultId, TournamentResultUpdate, TournamentUpdate,
};
use crate::matches::ValidatedMatch;
use async_trait::async_trait;
use log::debug;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

fn team_from_row(row: &PgRow) -> sqlx::Result<Team> {
    Ok(Team {
        id: row.try_get("team_id")?,
        name: row.try_get("team_name")?,
        region: row.try_get("region")?,
        founded_year: row.try_get("founded_year")?,
    })
}

fn player_from_row(row: &PgRow) -> sqlx::Result<Player> {
    Ok(Player {
        id: row.try_get("player_id")?,
        name: row.try_get("player_name")?,
        country: row.try_get("country")?,
        role: row.try_get("role")?,
        team_id: row.try_get("team_id")?,
    })
}

fn tournament_from_row(row: &PgRow) -> sqlx::Result<Tournament> {
    Ok(Tournament {
        id: row.try_get("tournament_id")?,
        name: row.try_get("name")?,
        organizer: row.try_get("organizer")?,
        prize_pool: row.try_get("prize_pool")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        location: row.try_get("location")?,
    })
}

fn map_from_row(row: &PgRow) -> sqlx::Result<Map> {
    Ok(Map {
        id: row.try_get("map_id")?,
        name: row.try_get("map_name")?,
    })
}

fn map_pool_entry_from_row(row: &PgRow) -> sqlx::Result<MapPoolEntry> {
    let status: String = row.try_get("status")?;
    Ok(MapPoolEntry {
        id: row.try_get("map_pool_id")?,
        map_id: row.try_get("map_id")?,
        status: status
            .parse::<MapPoolStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        valid_from: row.try_get("valid_from")?,
        valid_to: row.try_get("valid_to")?,
    })
}

fn match_from_row(row: &PgRow) -> sqlx::Result<Match> {
    Ok(Match {
        id: row.try_get("match_id")?,
        tournament_id: row.try_get("tournament_id")?,
        team1_id: row.try_get("team1_id")?,
        team2_id: row.try_get("team2_id")?,
        winner_team_id: row.try_get("winner_team_id")?,
        map_id: row.try_get("map_id")?,
        match_date: row.try_get("match_date")?,
        best_of: row.try_get("best_of")?,
        team1_score: row.try_get("team1_score")?,
        team2_score: row.try_get("team2_score")?,
    })
}

fn result_from_row(row: &PgRow) -> sqlx::Result<TournamentResult> {
    Ok(TournamentResult {
        id: row.try_get("result_id")?,
        tournament_id: row.try_get("tournament_id")?,
        team_id: row.try_get("team_id")?,
        placement: row.try_get("placement")?,
        earnings: row.try_get("earnings")?,
    })
}

fn roster_entry_from_row(row: &PgRow) -> sqlx::Result<RosterEntry> {
    Ok(RosterEntry {
        id: row.try_get("roster_id")?,
        team_id: row.try_get("team_id")?,
        player_id: row.try_get("player_id")?,
        is_active: row.try_get("is_active")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
    })
}

fn collect<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> sqlx::Result<T>) -> sqlx::Result<Vec<T>> {
    rows.iter().map(map).collect()
}

/// Entity store backed by the tables in [`crate::db::schema`]
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn create_team(&self, team: &NewTeam) -> StoreResult<Team> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (team_name, region, founded_year)
            VALUES ($1, $2, $3)
            RETURNING team_id, team_name, region, founded_year
            "#,
        )
        .bind(&team.name)
        .bind(&team.region)
        .bind(team.founded_year)
        .fetch_one(&self.pool)
        .await?;

        Ok(team_from_row(&row)?)
    }

    async fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT team_id, team_name, region, founded_year FROM teams WHERE team_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(team_from_row).transpose()?)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT team_id, team_name, region, founded_year FROM teams ORDER BY team_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, team_from_row)?)
    }

    async fn update_team(&self, id: TeamId, update: &TeamUpdate) -> StoreResult<Team> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT team_id, team_name, region, founded_year
            FROM teams
            WHERE team_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Team", id))?;

        let mut team = team_from_row(&current)?;
        update.apply(&mut team);

        sqlx::query(
            "UPDATE teams SET team_name = $2, region = $3, founded_year = $4 WHERE team_id = $1",
        )
        .bind(id)
        .bind(&team.name)
        .bind(&team.region)
        .bind(team.founded_year)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(team)
    }

    async fn delete_team(&self, id: TeamId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE team_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let row = sqlx::query(
            r#"
            INSERT INTO players (player_name, country, role, team_id)
            VALUES ($1, $2, $3, $4)
            RETURNING player_id, player_name, country, role, team_id
            "#,
        )
        .bind(&player.name)
        .bind(&player.country)
        .bind(&player.role)
        .bind(player.team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(player_from_row(&row)?)
    }

    async fn get_player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        let row = sqlx::query(
            r#"
            SELECT player_id, player_name, country, role, team_id
            FROM players
            WHERE player_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(player_from_row).transpose()?)
    }

    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query(
            "SELECT player_id, player_name, country, role, team_id FROM players ORDER BY player_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, player_from_row)?)
    }

    async fn update_player(&self, id: PlayerId, update: &PlayerUpdate) -> StoreResult<Player> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT player_id, player_name, country, role, team_id
            FROM players
            WHERE player_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Player", id))?;

        let mut player = player_from_row(&current)?;
        update.apply(&mut player);

        sqlx::query(
            r#"
            UPDATE players
            SET player_name = $2, country = $3, role = $4, team_id = $5
            WHERE player_id = $1
            "#,
        )
        .bind(id)
        .bind(&player.name)
        .bind(&player.country)
        .bind(&player.role)
        .bind(player.team_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(player)
    }

    async fn delete_player(&self, id: PlayerId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM players WHERE player_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_tournament(&self, tournament: &NewTournament) -> StoreResult<Tournament> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (name, organizer, prize_pool, start_date, end_date, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING tournament_id, name, organizer, prize_pool, start_date, end_date, location
            "#,
        )
        .bind(&tournament.name)
        .bind(&tournament.organizer)
        .bind(tournament.prize_pool)
        .bind(tournament.start_date)
        .bind(tournament.end_date)
        .bind(&tournament.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(tournament_from_row(&row)?)
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(
            r#"
            SELECT tournament_id, name, organizer, prize_pool, start_date, end_date, location
            FROM tournaments
            WHERE tournament_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let rows = sqlx::query(
            r#"
            SELECT tournament_id, name, organizer, prize_pool, start_date, end_date, location
            FROM tournaments
            ORDER BY tournament_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, tournament_from_row)?)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> StoreResult<Tournament> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT tournament_id, name, organizer, prize_pool, start_date, end_date, location
            FROM tournaments
            WHERE tournament_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Tournament", id))?;

        let mut tournament = tournament_from_row(&current)?;
        update.apply(&mut tournament);

        sqlx::query(
            r#"
            UPDATE tournaments
            SET name = $2, organizer = $3, prize_pool = $4,
                start_date = $5, end_date = $6, location = $7
            WHERE tournament_id = $1
            "#,
        )
        .bind(id)
        .bind(&tournament.name)
        .bind(&tournament.organizer)
        .bind(tournament.prize_pool)
        .bind(tournament.start_date)
        .bind(tournament.end_date)
        .bind(&tournament.location)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tournament)
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE tournament_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_map(&self, map: &NewMap) -> StoreResult<Map> {
        let row = sqlx::query("INSERT INTO maps (map_name) VALUES ($1) RETURNING map_id, map_name")
            .bind(&map.name)
            .fetch_one(&self.pool)
            .await?;

        Ok(map_from_row(&row)?)
    }

    async fn get_map(&self, id: MapId) -> StoreResult<Option<Map>> {
        let row = sqlx::query("SELECT map_id, map_name FROM maps WHERE map_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_from_row).transpose()?)
    }

    async fn list_maps(&self) -> StoreResult<Vec<Map>> {
        let rows = sqlx::query("SELECT map_id, map_name FROM maps ORDER BY map_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(collect(rows, map_from_row)?)
    }

    async fn update_map(&self, id: MapId, update: &MapUpdate) -> StoreResult<Map> {
        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query("SELECT map_id, map_name FROM maps WHERE map_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found("Map", id))?;

        let mut map = map_from_row(&current)?;
        update.apply(&mut map);

        sqlx::query("UPDATE maps SET map_name = $2 WHERE map_id = $1")
            .bind(id)
            .bind(&map.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(map)
    }

    async fn delete_map(&self, id: MapId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM maps WHERE map_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_map_pool_entry(&self, entry: &NewMapPoolEntry) -> StoreResult<MapPoolEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO map_pool (map_id, status, valid_from, valid_to)
            VALUES ($1, $2, $3, $4)
            RETURNING map_pool_id, map_id, status, valid_from, valid_to
            "#,
        )
        .bind(entry.map_id)
        .bind(entry.status.as_str())
        .bind(entry.valid_from)
        .bind(entry.valid_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_pool_entry_from_row(&row)?)
    }

    async fn get_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<Option<MapPoolEntry>> {
        let row = sqlx::query(
            r#"
            SELECT map_pool_id, map_id, status, valid_from, valid_to
            FROM map_pool
            WHERE map_pool_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_pool_entry_from_row).transpose()?)
    }

    async fn list_map_pool_entries(&self, map: Option<MapId>) -> StoreResult<Vec<MapPoolEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT map_pool_id, map_id, status, valid_from, valid_to
            FROM map_pool
            WHERE $1::BIGINT IS NULL OR map_id = $1
            ORDER BY map_pool_id
            "#,
        )
        .bind(map)
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, map_pool_entry_from_row)?)
    }

    async fn update_map_pool_entry(
        &self,
        id: MapPoolEntryId,
        update: &MapPoolEntryUpdate,
    ) -> StoreResult<MapPoolEntry> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT map_pool_id, map_id, status, valid_from, valid_to
            FROM map_pool
            WHERE map_pool_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("MapPoolEntry", id))?;

        let mut entry = map_pool_entry_from_row(&current)?;
        update.apply(&mut entry);

        sqlx::query(
            r#"
            UPDATE map_pool
            SET status = $2, valid_from = $3, valid_to = $4
            WHERE map_pool_id = $1
            "#,
        )
        .bind(id)
        .bind(entry.status.as_str())
        .bind(entry.valid_from)
        .bind(entry.valid_to)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_map_pool_entry(&self, id: MapPoolEntryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM map_pool WHERE map_pool_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_match(&self, validated: &ValidatedMatch) -> StoreResult<Match> {
        let request = validated.request();
        let row = sqlx::query(
            r#"
            INSERT INTO matches (
                tournament_id, team1_id, team2_id, winner_team_id, map_id,
                match_date, best_of, team1_score, team2_score
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING match_id, tournament_id, team1_id, team2_id, winner_team_id, map_id,
                      match_date, best_of, team1_score, team2_score
            "#,
        )
        .bind(request.tournament_id)
        .bind(request.team1_id)
        .bind(request.team2_id)
        .bind(request.winner_team_id)
        .bind(request.map_id)
        .bind(request.match_date)
        .bind(validated.best_of())
        .bind(request.team1_score)
        .bind(request.team2_score)
        .fetch_one(&self.pool)
        .await?;

        Ok(match_from_row(&row)?)
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query(
            r#"
            SELECT match_id, tournament_id, team1_id, team2_id, winner_team_id, map_id,
                   match_date, best_of, team1_score, team2_score
            FROM matches
            WHERE match_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn list_matches(&self, tournament: Option<TournamentId>) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(
            r#"
            SELECT match_id, tournament_id, team1_id, team2_id, winner_team_id, map_id,
                   match_date, best_of, team1_score, team2_score
            FROM matches
            WHERE $1::BIGINT IS NULL OR tournament_id = $1
            ORDER BY match_id
            "#,
        )
        .bind(tournament)
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, match_from_row)?)
    }

    async fn replace_match(&self, id: MatchId, validated: &ValidatedMatch) -> StoreResult<Match> {
        let request = validated.request();
        let row = sqlx::query(
            r#"
            UPDATE matches
            SET tournament_id = $2, team1_id = $3, team2_id = $4, winner_team_id = $5,
                map_id = $6, match_date = $7, best_of = $8, team1_score = $9, team2_score = $10
            WHERE match_id = $1
            RETURNING match_id, tournament_id, team1_id, team2_id, winner_team_id, map_id,
                      match_date, best_of, team1_score, team2_score
            "#,
        )
        .bind(id)
        .bind(request.tournament_id)
        .bind(request.team1_id)
        .bind(request.team2_id)
        .bind(request.winner_team_id)
        .bind(request.map_id)
        .bind(request.match_date)
        .bind(validated.best_of())
        .bind(request.team1_score)
        .bind(request.team2_score)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Match", id))?;

        Ok(match_from_row(&row)?)
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE match_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_tournament_result(
        &self,
        result: &NewTournamentResult,
    ) -> StoreResult<TournamentResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournament_results (tournament_id, team_id, placement, earnings)
            VALUES ($1, $2, $3, $4)
            RETURNING result_id, tournament_id, team_id, placement, earnings
            "#,
        )
        .bind(result.tournament_id)
        .bind(result.team_id)
        .bind(result.placement)
        .bind(result.earnings)
        .fetch_one(&self.pool)
        .await?;

        Ok(result_from_row(&row)?)
    }

    async fn get_tournament_result(
        &self,
        id: TournamentResultId,
    ) -> StoreResult<Option<TournamentResult>> {
        let row = sqlx::query(
            r#"
            SELECT result_id, tournament_id, team_id, placement, earnings
            FROM tournament_results
            WHERE result_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(result_from_row).transpose()?)
    }

    async fn list_tournament_results(
        &self,
        tournament: Option<TournamentId>,
    ) -> StoreResult<Vec<TournamentResult>> {
        let rows = sqlx::query(
            r#"
            SELECT result_id, tournament_id, team_id, placement, earnings
            FROM tournament_results
            WHERE $1::BIGINT IS NULL OR tournament_id = $1
            ORDER BY result_id
            "#,
        )
        .bind(tournament)
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, result_from_row)?)
    }

    async fn update_tournament_result(
        &self,
        id: TournamentResultId,
        update: &TournamentResultUpdate,
    ) -> StoreResult<TournamentResult> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT result_id, tournament_id, team_id, placement, earnings
            FROM tournament_results
            WHERE result_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("TournamentResult", id))?;

        let mut result = result_from_row(&current)?;
        update.apply(&mut result);

        sqlx::query(
            r#"
            UPDATE tournament_results
            SET tournament_id = $2, team_id = $3, placement = $4, earnings = $5
            WHERE result_id = $1
            "#,
        )
        .bind(id)
        .bind(result.tournament_id)
        .bind(result.team_id)
        .bind(result.placement)
        .bind(result.earnings)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result)
    }

    async fn delete_tournament_result(&self, id: TournamentResultId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tournament_results WHERE result_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn roster_scope(&self, team: TeamId) -> StoreResult<Box<dyn RosterScope>> {
        let mut tx = self.pool.begin().await?;

        // Serializes roster scopes and blocks team deletion. NO KEY UPDATE
        // leaves the KEY SHARE locks taken by foreign key checks free, so
        // inserts referencing the team elsewhere do not queue behind a scope.
        let locked = with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            sqlx::query("SELECT team_id FROM teams WHERE team_id = $1 FOR NO KEY UPDATE")
                .bind(team)
                .fetch_optional(&mut *tx),
        )
        .await?;

        if locked.is_none() {
            return Err(StoreError::not_found("Team", team));
        }

        debug!("Locked roster of team {team}");
        Ok(Box::new(PgRosterScope { tx, team_id: team }))
    }

    async fn get_roster_entry(&self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>> {
        let row = sqlx::query(
            r#"
            SELECT roster_id, team_id, player_id, is_active, start_date, end_date
            FROM team_roster
            WHERE roster_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(roster_entry_from_row).transpose()?)
    }

    async fn list_roster_entries(&self, team: Option<TeamId>) -> StoreResult<Vec<RosterEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT roster_id, team_id, player_id, is_active, start_date, end_date
            FROM team_roster
            WHERE $1::BIGINT IS NULL OR team_id = $1
            ORDER BY roster_id
            "#,
        )
        .bind(team)
        .fetch_all(&self.pool)
        .await?;

        Ok(collect(rows, roster_entry_from_row)?)
    }

    async fn update_roster_dates(
        &self,
        id: RosterEntryId,
        update: &RosterEntryUpdate,
    ) -> StoreResult<RosterEntry> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            r#"
            SELECT roster_id, team_id, player_id, is_active, start_date, end_date
            FROM team_roster
            WHERE roster_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("RosterEntry", id))?;

        let mut entry = roster_entry_from_row(&current)?;
        update.apply(&mut entry);

        sqlx::query("UPDATE team_roster SET start_date = $2, end_date = $3 WHERE roster_id = $1")
            .bind(id)
            .bind(entry.start_date)
            .bind(entry.end_date)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_roster_entry(&self, id: RosterEntryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM team_roster WHERE roster_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn snapshot(&self) -> StoreResult<LeagueSnapshot> {
        let snapshot = with_timeout(LONG_OPERATION_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await?;

            let teams = sqlx::query(
                "SELECT team_id, team_name, region, founded_year FROM teams ORDER BY team_id",
            )
            .fetch_all(&mut *tx)
            .await?;
            let players = sqlx::query(
                r#"
                SELECT player_id, player_name, country, role, team_id
                FROM players
                ORDER BY player_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;
            let tournaments = sqlx::query(
                r#"
                SELECT tournament_id, name, organizer, prize_pool, start_date, end_date, location
                FROM tournaments
                ORDER BY tournament_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;
            let maps = sqlx::query("SELECT map_id, map_name FROM maps ORDER BY map_id")
                .fetch_all(&mut *tx)
                .await?;
            let map_pool = sqlx::query(
                r#"
                SELECT map_pool_id, map_id, status, valid_from, valid_to
                FROM map_pool
                ORDER BY map_pool_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;
            let matches = sqlx::query(
                r#"
                SELECT match_id, tournament_id, team1_id, team2_id, winner_team_id, map_id,
                       match_date, best_of, team1_score, team2_score
                FROM matches
                ORDER BY match_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;
            let results = sqlx::query(
                r#"
                SELECT result_id, tournament_id, team_id, placement, earnings
                FROM tournament_results
                ORDER BY result_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;
            let roster = sqlx::query(
                r#"
                SELECT roster_id, team_id, player_id, is_active, start_date, end_date
                FROM team_roster
                ORDER BY roster_id
                "#,
            )
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;

            Ok::<_, sqlx::Error>(LeagueSnapshot {
                teams: collect(teams, team_from_row)?,
                players: collect(players, player_from_row)?,
                tournaments: collect(tournaments, tournament_from_row)?,
                maps: collect(maps, map_from_row)?,
                map_pool: collect(map_pool, map_pool_entry_from_row)?,
                matches: collect(matches, match_from_row)?,
                results: collect(results, result_from_row)?,
                roster: collect(roster, roster_entry_from_row)?,
            })
        })
        .await?;

        Ok(snapshot)
    }
}

/// Roster scope holding a transaction with the team row locked
struct PgRosterScope {
    tx: Transaction<'static, Postgres>,
    team_id: TeamId,
}

#[async_trait]
impl RosterScope for PgRosterScope {
    fn team_id(&self) -> TeamId {
        self.team_id
    }

    async fn active_count(&mut self, excluding: Option<RosterEntryId>) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM team_roster
            WHERE team_id = $1 AND is_active AND roster_id IS DISTINCT FROM $2
            "#,
        )
        .bind(self.team_id)
        .bind(excluding)
        .fetch_one(&mut *self.tx)
        .await?;

        usize::try_from(count)
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
    }

    async fn get_entry(&mut self, id: RosterEntryId) -> StoreResult<Option<RosterEntry>> {
        let row = sqlx::query(
            r#"
            SELECT roster_id, team_id, player_id, is_active, start_date, end_date
            FROM team_roster
            WHERE roster_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(roster_entry_from_row).transpose()?)
    }

    async fn insert_entry(&mut self, entry: &NewRosterEntry) -> StoreResult<RosterEntry> {
        check_scope_team(self.team_id, entry.team_id)?;
        if entry.is_active {
            let others = self.active_count(None).await?;
            check_roster_room(self.team_id, others)?;
        }

        let row = sqlx::query(
            r#"
            INSERT INTO team_roster (team_id, player_id, is_active, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING roster_id, team_id, player_id, is_active, start_date, end_date
            "#,
        )
        .bind(entry.team_id)
        .bind(entry.player_id)
        .bind(entry.is_active)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(roster_entry_from_row(&row)?)
    }

    async fn set_active(&mut self, id: RosterEntryId, active: bool) -> StoreResult<RosterEntry> {
        let current = self
            .get_entry(id)
            .await?
            .ok_or_else(|| StoreError::not_found("RosterEntry", id))?;
        check_scope_team(self.team_id, current.team_id)?;
        if active && !current.is_active {
            let others = self.active_count(Some(id)).await?;
            check_roster_room(self.team_id, others)?;
        }

        // team_id pins the row to the locked team
        let row = sqlx::query(
            r#"
            UPDATE team_roster
            SET is_active = $2
            WHERE roster_id = $1 AND team_id = $3
            RETURNING roster_id, team_id, player_id, is_active, start_date, end_date
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(self.team_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| StoreError::not_found("RosterEntry", id))?;

        Ok(roster_entry_from_row(&row)?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgRosterScope { tx, team_id } = *self;
        tx.commit().await?;
        debug!("Released roster of team {team_id}");
        Ok(())
    }
}
