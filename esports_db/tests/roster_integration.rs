//! Integration tests for the roster ceiling.
//!
//! Runs against the in-memory store, which serializes roster scopes per team
//! the same way the PostgreSQL store does with a row lock.

use esports_db::db::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use esports_db::entities::{NewPlayer, NewRosterEntry, NewTeam, PlayerUpdate, RosterEntry, TeamId};
use esports_db::roster::MAX_ACTIVE_ROSTER;
use esports_db::store::StoreError;
use esports_db::{EsportsError, EsportsManager};

/// Team plus `size` players on its bench (inactive entries)
async fn benched_team(
    league: &EsportsManager,
    name: &str,
    size: usize,
) -> (TeamId, Vec<RosterEntry>) {
    let team = league.create_team(&NewTeam::new(name, "EU")).await.unwrap();

    let mut entries = Vec::new();
    for i in 0..size {
        let player = league
            .create_player(&NewPlayer::new(format!("{name}-{i}")).on_team(team.id))
            .await
            .unwrap();
        let entry = league
            .add_roster_entry(&NewRosterEntry::new(team.id, player.id).inactive())
            .await
            .unwrap();
        entries.push(entry);
    }

    (team.id, entries)
}

async fn active_count(league: &EsportsManager, team: TeamId) -> usize {
    league
        .list_roster_entries(Some(team))
        .await
        .unwrap()
        .iter()
        .filter(|e| e.is_active)
        .count()
}

#[tokio::test]
async fn test_activation_stops_at_five() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "FURIA", 7).await;

    for entry in &entries[..5] {
        league.set_roster_active(entry.id, team, true).await.unwrap();
    }

    let err = league
        .set_roster_active(entries[5].id, team, true)
        .await
        .unwrap_err();
    assert!(matches!(err, EsportsError::RosterLimitExceeded { limit: 5, .. }));
    assert_eq!(active_count(&league, team).await, MAX_ACTIVE_ROSTER);

    // Rejected entry is untouched
    assert!(!league.get_roster_entry(entries[5].id).await.unwrap().is_active);
}

#[tokio::test]
async fn test_deactivation_frees_a_slot() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "Heroic", 6).await;

    for entry in &entries[..5] {
        league.set_roster_active(entry.id, team, true).await.unwrap();
    }
    league.set_roster_active(entries[0].id, team, false).await.unwrap();
    league.set_roster_active(entries[5].id, team, true).await.unwrap();

    assert_eq!(active_count(&league, team).await, 5);
}

#[tokio::test]
async fn test_deactivate_twice_is_noop() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "Complexity", 1).await;
    let entry = entries[0].id;

    league.set_roster_active(entry, team, true).await.unwrap();
    let first = league.set_roster_active(entry, team, false).await.unwrap();
    let second = league.set_roster_active(entry, team, false).await.unwrap();

    assert!(!first.is_active);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_ceiling_is_per_team() {
    let league = EsportsManager::in_memory();
    let (red, red_entries) = benched_team(&league, "Red", 5).await;
    let (blue, blue_entries) = benched_team(&league, "Blue", 5).await;

    for (r, b) in red_entries.iter().zip(&blue_entries) {
        league.set_roster_active(r.id, red, true).await.unwrap();
        league.set_roster_active(b.id, blue, true).await.unwrap();
    }

    assert_eq!(active_count(&league, red).await, 5);
    assert_eq!(active_count(&league, blue).await, 5);
}

#[tokio::test]
async fn test_active_insert_is_guarded() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "MIBR", 5).await;
    for entry in &entries {
        league.set_roster_active(entry.id, team, true).await.unwrap();
    }

    let newcomer = league.create_player(&NewPlayer::new("coldzera")).await.unwrap();
    let err = league
        .add_roster_entry(&NewRosterEntry::new(team, newcomer.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EsportsError::RosterLimitExceeded { .. }));
    assert_eq!(league.list_roster_entries(Some(team)).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_player_transfer_keeps_roster_rows() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "Cloud9", 1).await;
    let other = league.create_team(&NewTeam::new("Eternal Fire", "TR")).await.unwrap();

    let update = PlayerUpdate {
        team_id: Some(Some(other.id)),
        ..Default::default()
    };
    league.update_player(entries[0].player_id, &update).await.unwrap();

    // Roster history is independent of the player's current team reference
    assert_eq!(league.list_roster_entries(Some(team)).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_activations_fill_exactly_to_ceiling() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "Virtus.pro", 12).await;

    let handles: Vec<_> = entries
        .iter()
        .map(|entry| {
            let league = league.clone();
            let id = entry.id;
            tokio::spawn(async move { league.set_roster_active(id, team, true).await })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(EsportsError::RosterLimitExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(rejected, 7);
    assert_eq!(active_count(&league, team).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_fill_exactly_to_ceiling() {
    let league = EsportsManager::in_memory();
    let team = league.create_team(&NewTeam::new("OG", "EU")).await.unwrap().id;

    let mut players = Vec::new();
    for i in 0..9 {
        let player = league
            .create_player(&NewPlayer::new(format!("og-{i}")))
            .await
            .unwrap();
        players.push(player.id);
    }

    let handles: Vec<_> = players
        .into_iter()
        .map(|player| {
            let league = league.clone();
            tokio::spawn(async move {
                league
                    .add_roster_entry(&NewRosterEntry::new(team, player))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(active_count(&league, team).await, 5);
}

#[tokio::test]
async fn test_store_roster_scope_enforces_ceiling_on_insert() {
    let league = EsportsManager::in_memory();
    let team = league.create_team(&NewTeam::new("Complexity", "NA")).await.unwrap().id;

    let mut accepted = 0;
    for i in 0..7 {
        let player = league
            .create_player(&NewPlayer::new(format!("col-{i}")))
            .await
            .unwrap();
        let mut scope = league.store().roster_scope(team).await.unwrap();
        match scope.insert_entry(&NewRosterEntry::new(team, player.id)).await {
            Ok(_) => accepted += 1,
            Err(StoreError::RosterFull { limit, .. }) => assert_eq!(limit, MAX_ACTIVE_ROSTER),
            Err(other) => panic!("unexpected error: {other}"),
        }
        scope.commit().await.unwrap();
    }

    assert_eq!(accepted, MAX_ACTIVE_ROSTER);
    assert_eq!(active_count(&league, team).await, MAX_ACTIVE_ROSTER);
}

#[tokio::test]
async fn test_store_roster_scope_enforces_ceiling_on_activation() {
    let league = EsportsManager::in_memory();
    let (team, entries) = benched_team(&league, "Imperial", 7).await;

    for entry in &entries {
        let mut scope = league.store().roster_scope(team).await.unwrap();
        let _ = scope.set_active(entry.id, true).await;
        scope.commit().await.unwrap();
    }

    assert_eq!(active_count(&league, team).await, MAX_ACTIVE_ROSTER);

    let mut scope = league.store().roster_scope(team).await.unwrap();
    let err = scope.set_active(entries[6].id, true).await.unwrap_err();
    assert!(matches!(err, StoreError::RosterFull { team_id, .. } if team_id == team));
}

#[tokio::test(start_paused = true)]
async fn test_held_scope_only_blocks_its_own_team() {
    let league = EsportsManager::in_memory();
    let (red, red_entries) = benched_team(&league, "Red", 1).await;
    let (blue, blue_entries) = benched_team(&league, "Blue", 1).await;

    let held = league.store().roster_scope(red).await.unwrap();

    // Another team's roster is not behind the held lock
    let activated = league
        .set_roster_active(blue_entries[0].id, blue, true)
        .await
        .unwrap();
    assert!(activated.is_active);

    let err = league
        .set_roster_active(red_entries[0].id, red, true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EsportsError::Store(StoreError::Timeout(waited)) if waited == DEFAULT_TRANSACTION_TIMEOUT
    ));
    assert!(!league.get_roster_entry(red_entries[0].id).await.unwrap().is_active);

    drop(held);
    league
        .set_roster_active(red_entries[0].id, red, true)
        .await
        .unwrap();
    assert_eq!(active_count(&league, red).await, 1);
}
