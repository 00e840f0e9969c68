//! Create/read/update/delete pass over every entity.
//!
//! Everything the pass creates is deleted again before it returns, whether it
//! succeeds or fails, so it can run against a live league.

use anyhow::{Context, ensure};
use chrono::{NaiveDate, Utc};
use esports_db::EsportsManager;
use esports_db::entities::{
    MapId, MapPoolStatus, NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam,
    NewTournament, NewTournamentResult, PlayerId, TeamId, TeamUpdate, TournamentId,
};
use esports_db::matches::MatchRequest;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Parent rows created so far. Deleting them cascades to everything else the
/// pass creates.
#[derive(Debug, Default)]
struct Created {
    teams: Vec<TeamId>,
    player: Option<PlayerId>,
    tournament: Option<TournamentId>,
    map: Option<MapId>,
}

impl Created {
    /// Best-effort removal after a failed pass
    async fn remove(&self, league: &EsportsManager) {
        // Tournament and map first: their cascades take the matches that
        // would otherwise block the team deletes
        if let Some(id) = self.tournament {
            log_cleanup("tournament", id, league.delete_tournament(id).await);
        }
        if let Some(id) = self.map {
            log_cleanup("map", id, league.delete_map(id).await);
        }
        if let Some(id) = self.player {
            log_cleanup("player", id, league.delete_player(id).await);
        }
        for &id in &self.teams {
            log_cleanup("team", id, league.delete_team(id).await);
        }
    }
}

fn log_cleanup(entity: &str, id: impl std::fmt::Display, outcome: esports_db::EsportsResult<bool>) {
    if let Err(e) = outcome {
        warn!("Could not remove smoke {entity} {id}: {e}");
    }
}

pub async fn run(league: &EsportsManager) -> anyhow::Result<()> {
    // Suffix keeps the unique team and map names free on reruns
    run_tagged(league, Utc::now().timestamp_millis()).await
}

async fn run_tagged(league: &EsportsManager, tag: i64) -> anyhow::Result<()> {
    info!("Running smoke pass");

    let mut created = Created::default();
    let outcome = exercise(league, tag, &mut created).await;
    if outcome.is_err() {
        warn!("Smoke pass failed, removing the rows it created");
        created.remove(league).await;
    }
    outcome
}

async fn exercise(league: &EsportsManager, tag: i64, created: &mut Created) -> anyhow::Result<()> {
    let day = NaiveDate::from_ymd_opt(2025, 1, 1).context("fixture date")?;

    let team = league
        .create_team(&NewTeam::new(format!("Smoke Team {tag}"), "EU").founded(2024))
        .await?;
    created.teams.push(team.id);
    let opponent = league
        .create_team(&NewTeam::new(format!("Smoke Opponent {tag}"), "NA"))
        .await?;
    created.teams.push(opponent.id);
    info!("Created teams {} and {}", team.id, opponent.id);

    let player = league
        .create_player(
            &NewPlayer::new("Smoke Player")
                .country("Nowhere")
                .role("Rifler")
                .on_team(team.id),
        )
        .await?;
    created.player = Some(player.id);
    let tournament = league
        .create_tournament(
            &NewTournament::new(format!("Smoke Open {tag}"))
                .organizer("TestOrg")
                .prize_pool(Decimal::new(10_000, 0))
                .dates(day, day.succ_opt().unwrap_or(day))
                .location("Online"),
        )
        .await?;
    created.tournament = Some(tournament.id);
    let map = league
        .create_map(&NewMap::new(format!("Smoke Map {tag}")))
        .await?;
    created.map = Some(map.id);
    let pool_entry = league
        .record_map_pool_entry(&NewMapPoolEntry::new(map.id, MapPoolStatus::Active, day))
        .await?;
    info!(
        "Created player {}, tournament {}, map {}",
        player.id, tournament.id, map.id
    );

    let match_id = league
        .create_match(
            MatchRequest::new(tournament.id, team.id, opponent.id)
                .scores(1, 0)
                .winner(team.id)
                .on_map(map.id)
                .played_on(day),
        )
        .await?;
    let result = league
        .record_tournament_result(
            &NewTournamentResult::new(tournament.id, team.id, 1).earnings(Decimal::new(5_000, 0)),
        )
        .await?;
    let roster = league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id).starting(day))
        .await?;
    info!(
        "Created match {}, result {}, roster entry {}",
        match_id, result.id, roster.id
    );

    let renamed = format!("Smoke Team {tag} Updated");
    let update = TeamUpdate {
        name: Some(renamed.clone()),
        ..Default::default()
    };
    league.update_team(team.id, &update).await?;
    let read_back = league.get_team(team.id).await?;
    ensure!(read_back.name == renamed, "team rename was not persisted");
    info!("Updated team name -> {}", read_back.name);

    let summary = league.team_summary().await?;
    let row = summary
        .iter()
        .find(|s| s.team_id == team.id)
        .context("smoke team missing from summary")?;
    ensure!(
        row.matches_played == 1 && row.wins == 1,
        "unexpected summary for smoke team: {row:?}"
    );

    // Children before parents
    league.delete_tournament_result(result.id).await?;
    league.delete_match(match_id).await?;
    league.delete_roster_entry(roster.id).await?;
    league.delete_player(player.id).await?;
    league.delete_map_pool_entry(pool_entry.id).await?;
    league.delete_map(map.id).await?;
    league.delete_tournament(tournament.id).await?;
    league.delete_team(team.id).await?;
    league.delete_team(opponent.id).await?;

    info!("Cleanup complete, smoke pass succeeded");
    Ok(())
}
