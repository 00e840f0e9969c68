//! Guarded roster writes.

use super::errors::{RosterError, RosterResult};
use crate::entities::{NewRosterEntry, RosterEntry, RosterEntryId, TeamId};
use crate::store::{EntityStore, StoreError};
use log::{info, warn};
use std::sync::Arc;

/// Most roster entries a team may have active at once
pub const MAX_ACTIVE_ROSTER: usize = 5;

/// Guarded roster writes for the league manager
///
/// The ceiling itself is enforced by [`crate::store::RosterScope`], which
/// counts and writes under the team's lock. The guard adds the entry lookup,
/// the team check and the no-op rules, and turns a full roster into
/// [`RosterError::LimitExceeded`].
#[derive(Clone)]
pub struct RosterGuard {
    store: Arc<dyn EntityStore>,
}

impl RosterGuard {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Create a roster entry, checking the ceiling when it starts active
    ///
    /// # Errors
    ///
    /// * `RosterError::LimitExceeded` - the team already has a full active roster
    /// * `RosterError::Store` - missing team or player, duplicate membership,
    ///   invalid dates
    pub async fn add_roster_entry(&self, entry: &NewRosterEntry) -> RosterResult<RosterEntry> {
        let mut scope = self.store.roster_scope(entry.team_id).await?;

        let created = scope.insert_entry(entry).await.map_err(|e| {
            full_roster(e, || {
                format!(
                    "Rejected roster entry for player {} on team {}",
                    entry.player_id, entry.team_id
                )
            })
        })?;
        scope.commit().await?;

        info!(
            "Player {} joined team {} (entry {}, active: {})",
            created.player_id, created.team_id, created.id, created.is_active
        );
        Ok(created)
    }

    /// Activate or deactivate a roster entry of `team_id`
    ///
    /// Deactivation always succeeds. Setting the flag to its current value is
    /// a no-op that returns the stored entry.
    ///
    /// # Errors
    ///
    /// * `RosterError::LimitExceeded` - activating would exceed the ceiling
    /// * `RosterError::TeamMismatch` - the entry belongs to another team
    /// * `RosterError::Store` - the entry or team does not exist
    pub async fn set_roster_active(
        &self,
        entry_id: RosterEntryId,
        team_id: TeamId,
        make_active: bool,
    ) -> RosterResult<RosterEntry> {
        let mut scope = self.store.roster_scope(team_id).await?;

        let entry = scope
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| StoreError::not_found("RosterEntry", entry_id))?;

        if entry.team_id != team_id {
            return Err(RosterError::TeamMismatch {
                entry_id,
                expected: team_id,
                actual: entry.team_id,
            });
        }

        if entry.is_active == make_active {
            scope.commit().await?;
            return Ok(entry);
        }

        let updated = scope
            .set_active(entry_id, make_active)
            .await
            .map_err(|e| {
                full_roster(e, || {
                    format!("Rejected activation of entry {entry_id} on team {team_id}")
                })
            })?;
        scope.commit().await?;

        info!(
            "Roster entry {entry_id} on team {team_id} is now {}",
            if make_active { "active" } else { "inactive" }
        );
        Ok(updated)
    }
}

fn full_roster(err: StoreError, context: impl FnOnce() -> String) -> RosterError {
    match err {
        StoreError::RosterFull { team_id, limit } => {
            warn!("{}: {limit} already active", context());
            RosterError::LimitExceeded { team_id, limit }
        }
        other => RosterError::Store(other),
    }
}
