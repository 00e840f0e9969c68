//! Integration tests for referential integrity and column constraints.
//!
//! The in-memory store reports the same constraint names as the PostgreSQL
//! schema, so these expectations hold for both backends.

use chrono::NaiveDate;
use esports_db::entities::{
    MapPoolStatus, NewMap, NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament,
    NewTournamentResult, RosterEntryUpdate, TeamUpdate, TournamentUpdate,
};
use esports_db::matches::MatchRequest;
use esports_db::store::constraints::names;
use esports_db::store::{ConstraintKind, StoreError};
use esports_db::{EsportsError, EsportsManager};
use rust_decimal::Decimal;

fn constraint(err: &EsportsError) -> Option<(ConstraintKind, &str)> {
    match err {
        EsportsError::Store(StoreError::ConstraintViolation { kind, constraint }) => {
            Some((*kind, constraint.as_str()))
        }
        _ => None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_team_name_unique_and_region_required() {
    let league = EsportsManager::in_memory();
    league.create_team(&NewTeam::new("Liquid", "NA")).await.unwrap();

    let dup = league
        .create_team(&NewTeam::new("Liquid", "EU"))
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&dup),
        Some((ConstraintKind::Unique, names::TEAM_NAME_UNIQUE))
    );
    assert_eq!(dup.client_message(), "team name must be unique");

    let blank = league.create_team(&NewTeam::new("NRG", "")).await.unwrap_err();
    assert_eq!(
        constraint(&blank),
        Some((ConstraintKind::Check, names::TEAM_REGION_CHK))
    );
}

#[tokio::test]
async fn test_failed_update_leaves_row_unchanged() {
    let league = EsportsManager::in_memory();
    league.create_team(&NewTeam::new("Falcons", "MENA")).await.unwrap();
    let gl = league.create_team(&NewTeam::new("GamerLegion", "EU")).await.unwrap();

    let rename = TeamUpdate {
        name: Some("Falcons".to_string()),
        ..Default::default()
    };
    assert!(league.update_team(gl.id, &rename).await.is_err());
    assert_eq!(league.get_team(gl.id).await.unwrap().name, "GamerLegion");
}

#[tokio::test]
async fn test_deleting_team_frees_players_and_drops_roster_and_results() {
    let league = EsportsManager::in_memory();
    let team = league.create_team(&NewTeam::new("Fnatic", "EU")).await.unwrap();
    let player = league
        .create_player(&NewPlayer::new("KRIMZ").role("Rifler").on_team(team.id))
        .await
        .unwrap();
    league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id))
        .await
        .unwrap();
    let event = league
        .create_tournament(&NewTournament::new("DreamHack Winter"))
        .await
        .unwrap();
    league
        .record_tournament_result(&NewTournamentResult::new(event.id, team.id, 1))
        .await
        .unwrap();

    assert!(league.delete_team(team.id).await.unwrap());

    let freed = league.get_player(player.id).await.unwrap();
    assert_eq!(freed.team_id, None);
    assert!(league.list_roster_entries(None).await.unwrap().is_empty());
    assert!(league.list_tournament_results(None).await.unwrap().is_empty());
    assert!(!league.delete_team(team.id).await.unwrap());
}

#[tokio::test]
async fn test_team_with_matches_cannot_be_deleted() {
    let league = EsportsManager::in_memory();
    let a = league.create_team(&NewTeam::new("SAW", "EU")).await.unwrap();
    let b = league.create_team(&NewTeam::new("9z", "SA")).await.unwrap();
    let event = league
        .create_tournament(&NewTournament::new("ESL Challenger"))
        .await
        .unwrap();
    league
        .create_match(MatchRequest::new(event.id, a.id, b.id))
        .await
        .unwrap();

    let err = league.delete_team(a.id).await.unwrap_err();
    assert_eq!(
        constraint(&err),
        Some((ConstraintKind::ForeignKey, names::MATCH_TEAM1_FK))
    );
    assert!(league.get_team(a.id).await.is_ok());
}

#[tokio::test]
async fn test_deleting_tournament_cascades() {
    let league = EsportsManager::in_memory();
    let a = league.create_team(&NewTeam::new("Imperial", "SA")).await.unwrap();
    let b = league.create_team(&NewTeam::new("paiN", "SA")).await.unwrap();
    let event = league
        .create_tournament(&NewTournament::new("CCT South America"))
        .await
        .unwrap();
    league
        .create_match(MatchRequest::new(event.id, a.id, b.id).scores(2, 0).winner(a.id))
        .await
        .unwrap();
    league
        .record_tournament_result(&NewTournamentResult::new(event.id, a.id, 1))
        .await
        .unwrap();

    assert!(league.delete_tournament(event.id).await.unwrap());

    assert!(league.list_matches(None).await.unwrap().is_empty());
    assert!(league.list_tournament_results(None).await.unwrap().is_empty());

    // With the matches gone the teams can be deleted
    assert!(league.delete_team(a.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_map_cascades_to_pool_and_matches() {
    let league = EsportsManager::in_memory();
    let a = league.create_team(&NewTeam::new("TheMongolz", "ASIA")).await.unwrap();
    let b = league.create_team(&NewTeam::new("Lynn Vision", "ASIA")).await.unwrap();
    let event = league
        .create_tournament(&NewTournament::new("Asia RMR"))
        .await
        .unwrap();
    let dust = league.create_map(&NewMap::new("Dust2")).await.unwrap();
    league
        .record_map_pool_entry(&NewMapPoolEntry::new(
            dust.id,
            MapPoolStatus::Active,
            date(2024, 4, 1),
        ))
        .await
        .unwrap();
    league
        .create_match(MatchRequest::new(event.id, a.id, b.id).on_map(dust.id))
        .await
        .unwrap();
    league
        .create_match(MatchRequest::new(event.id, b.id, a.id))
        .await
        .unwrap();

    assert!(league.delete_map(dust.id).await.unwrap());

    assert!(league.list_map_pool_entries(None).await.unwrap().is_empty());
    let remaining = league.list_matches(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].map_id, None);
}

#[tokio::test]
async fn test_deleting_player_drops_roster_entries() {
    let league = EsportsManager::in_memory();
    let team = league.create_team(&NewTeam::new("BetBoom", "CIS")).await.unwrap();
    let player = league.create_player(&NewPlayer::new("Boombl4")).await.unwrap();
    league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id))
        .await
        .unwrap();

    assert!(league.delete_player(player.id).await.unwrap());
    assert!(league.list_roster_entries(Some(team.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_result_uniqueness_within_tournament() {
    let league = EsportsManager::in_memory();
    let a = league.create_team(&NewTeam::new("Monte", "EU")).await.unwrap();
    let b = league.create_team(&NewTeam::new("Aurora", "EU")).await.unwrap();
    let event = league
        .create_tournament(&NewTournament::new("Thunderpick World Championship"))
        .await
        .unwrap();
    league
        .record_tournament_result(&NewTournamentResult::new(event.id, a.id, 1))
        .await
        .unwrap();

    let same_place = league
        .record_tournament_result(&NewTournamentResult::new(event.id, b.id, 1))
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&same_place),
        Some((ConstraintKind::Unique, names::RESULT_PLACEMENT_UNIQUE))
    );

    let same_team = league
        .record_tournament_result(&NewTournamentResult::new(event.id, a.id, 2))
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&same_team),
        Some((ConstraintKind::Unique, names::RESULT_TEAM_UNIQUE))
    );

    let negative = league
        .record_tournament_result(
            &NewTournamentResult::new(event.id, b.id, 2).earnings(Decimal::new(-1, 0)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&negative),
        Some((ConstraintKind::Check, names::RESULT_EARNINGS_CHK))
    );
}

#[tokio::test]
async fn test_date_ordering_checks() {
    let league = EsportsManager::in_memory();

    let backwards = league
        .create_tournament(
            &NewTournament::new("Backwards Cup").dates(date(2024, 5, 2), date(2024, 5, 1)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&backwards),
        Some((ConstraintKind::Check, names::TOURNAMENT_DATES_CHK))
    );

    let event = league
        .create_tournament(
            &NewTournament::new("Same Day Cup").dates(date(2024, 5, 1), date(2024, 5, 1)),
        )
        .await
        .unwrap();
    let clear_end = TournamentUpdate {
        end_date: Some(None),
        ..Default::default()
    };
    assert_eq!(
        league.update_tournament(event.id, &clear_end).await.unwrap().end_date,
        None
    );

    let team = league.create_team(&NewTeam::new("Sashi", "EU")).await.unwrap();
    let player = league.create_player(&NewPlayer::new("jkaem")).await.unwrap();
    let entry = league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id).starting(date(2024, 1, 10)))
        .await
        .unwrap();
    let bad_end = RosterEntryUpdate {
        end_date: Some(Some(date(2024, 1, 9))),
        ..Default::default()
    };
    let err = league.update_roster_entry(entry.id, &bad_end).await.unwrap_err();
    assert_eq!(
        constraint(&err),
        Some((ConstraintKind::Check, names::ROSTER_DATES_CHK))
    );
}

#[tokio::test]
async fn test_roster_member_unique_and_player_must_exist() {
    let league = EsportsManager::in_memory();
    let team = league.create_team(&NewTeam::new("Nemiga", "CIS")).await.unwrap();
    let player = league.create_player(&NewPlayer::new("1eer")).await.unwrap();
    league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id))
        .await
        .unwrap();

    let twice = league
        .add_roster_entry(&NewRosterEntry::new(team.id, player.id).inactive())
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&twice),
        Some((ConstraintKind::Unique, names::ROSTER_MEMBER_UNIQUE))
    );

    let ghost = league
        .add_roster_entry(&NewRosterEntry::new(team.id, esports_db::entities::PlayerId(999)))
        .await
        .unwrap_err();
    assert_eq!(
        constraint(&ghost),
        Some((ConstraintKind::ForeignKey, names::ROSTER_PLAYER_FK))
    );
}
