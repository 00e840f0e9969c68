/// Property-based tests for the roster ceiling using proptest
///
/// Arbitrary activate/deactivate sequences across two teams never leave a
/// team with more than five active entries, and every call is accepted or
/// rejected exactly as a simple counting model predicts.
use esports_db::entities::{NewPlayer, NewRosterEntry, NewTeam, RosterEntryId, TeamId};
use esports_db::roster::MAX_ACTIVE_ROSTER;
use esports_db::{EsportsError, EsportsManager};
use proptest::prelude::*;

const BENCH_SIZE: usize = 8;

// (team index, bench slot, make_active)
fn operation_strategy() -> impl Strategy<Value = (usize, usize, bool)> {
    (0usize..2, 0usize..BENCH_SIZE, any::<bool>())
}

async fn setup(league: &EsportsManager) -> Vec<(TeamId, Vec<RosterEntryId>)> {
    let mut teams = Vec::new();
    for name in ["Alpha", "Bravo"] {
        let team = league.create_team(&NewTeam::new(name, "EU")).await.unwrap();
        let mut bench = Vec::new();
        for slot in 0..BENCH_SIZE {
            let player = league
                .create_player(&NewPlayer::new(format!("{name}{slot}")))
                .await
                .unwrap();
            let entry = league
                .add_roster_entry(&NewRosterEntry::new(team.id, player.id).inactive())
                .await
                .unwrap();
            bench.push(entry.id);
        }
        teams.push((team.id, bench));
    }
    teams
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_active_count_never_exceeds_ceiling(
        ops in prop::collection::vec(operation_strategy(), 1..60)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let league = EsportsManager::in_memory();
            let teams = setup(&league).await;
            let mut model = [[false; BENCH_SIZE]; 2];

            for (team_idx, slot, make_active) in ops {
                let (team, bench) = &teams[team_idx];
                let others = model[team_idx]
                    .iter()
                    .enumerate()
                    .filter(|(i, active)| **active && *i != slot)
                    .count();
                let should_pass =
                    !make_active || model[team_idx][slot] || others < MAX_ACTIVE_ROSTER;

                let outcome = league.set_roster_active(bench[slot], *team, make_active).await;
                match outcome {
                    Ok(entry) => {
                        prop_assert!(should_pass);
                        prop_assert_eq!(entry.is_active, make_active);
                        model[team_idx][slot] = make_active;
                    }
                    Err(EsportsError::RosterLimitExceeded { .. }) => prop_assert!(!should_pass),
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }

                let active = league
                    .list_roster_entries(Some(*team))
                    .await
                    .unwrap()
                    .iter()
                    .filter(|e| e.is_active)
                    .count();
                prop_assert!(active <= MAX_ACTIVE_ROSTER);
                prop_assert_eq!(active, model[team_idx].iter().filter(|a| **a).count());
            }
            Ok(())
        })?;
    }
}
