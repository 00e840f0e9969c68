//! Map pool standing at a date.

use crate::entities::{MapId, MapPoolEntry, MapPoolEntryId, MapPoolStatus};
use crate::store::LeagueSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pool standing of one map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "listing", rename_all = "lowercase")]
pub enum MapPoolListing {
    /// An entry covers the date
    Listed {
        entry_id: MapPoolEntryId,
        status: MapPoolStatus,
        valid_from: NaiveDate,
        valid_to: Option<NaiveDate>,
    },
    /// No entry covers the date
    Unlisted,
}

impl MapPoolListing {
    pub fn status(&self) -> Option<MapPoolStatus> {
        match self {
            MapPoolListing::Listed { status, .. } => Some(*status),
            MapPoolListing::Unlisted => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPoolRow {
    pub map_id: MapId,
    pub map_name: String,
    #[serde(flatten)]
    pub listing: MapPoolListing,
}

/// Standing of every map at `as_of`, ordered by map name
///
/// An entry covers `as_of` when `valid_from <= as_of` and `as_of <= valid_to`
/// (or `valid_to` is open). Overlapping entries resolve to the latest
/// `valid_from`, then the highest entry id.
pub fn map_pool_status(snapshot: &LeagueSnapshot, as_of: NaiveDate) -> Vec<MapPoolRow> {
    let mut rows: Vec<MapPoolRow> = snapshot
        .maps
        .iter()
        .map(|map| {
            let listing = snapshot
                .map_pool
                .iter()
                .filter(|e| e.map_id == map.id && e.covers(as_of))
                .max_by_key(|e| (e.valid_from, e.id))
                .map_or(MapPoolListing::Unlisted, listed);

            MapPoolRow {
                map_id: map.id,
                map_name: map.name.clone(),
                listing,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.map_name.cmp(&b.map_name));
    rows
}

fn listed(entry: &MapPoolEntry) -> MapPoolListing {
    MapPoolListing::Listed {
        entry_id: entry.id,
        status: entry.status,
        valid_from: entry.valid_from,
        valid_to: entry.valid_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Map;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(
        id: i64,
        map: i64,
        status: MapPoolStatus,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> MapPoolEntry {
        MapPoolEntry {
            id: MapPoolEntryId(id),
            map_id: MapId(map),
            status,
            valid_from: from,
            valid_to: to,
        }
    }

    fn maps(names: &[&str]) -> Vec<Map> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Map {
                id: MapId(i as i64 + 1),
                name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_latest_covering_entry_wins() {
        let snapshot = LeagueSnapshot {
            maps: maps(&["Ancient"]),
            map_pool: vec![
                entry(1, 1, MapPoolStatus::Reserve, date(2020, 1, 1), None),
                entry(2, 1, MapPoolStatus::Active, date(2023, 6, 1), None),
            ],
            ..Default::default()
        };

        let rows = map_pool_status(&snapshot, date(2024, 1, 1));
        assert_eq!(rows[0].listing.status(), Some(MapPoolStatus::Active));

        let earlier = map_pool_status(&snapshot, date(2022, 1, 1));
        assert_eq!(earlier[0].listing.status(), Some(MapPoolStatus::Reserve));
    }

    #[test]
    fn test_same_start_resolves_to_highest_id() {
        let start = date(2024, 1, 1);
        let snapshot = LeagueSnapshot {
            maps: maps(&["Vertigo"]),
            map_pool: vec![
                entry(7, 1, MapPoolStatus::Active, start, None),
                entry(3, 1, MapPoolStatus::Reserve, start, None),
            ],
            ..Default::default()
        };

        let rows = map_pool_status(&snapshot, start);
        assert!(matches!(
            rows[0].listing,
            MapPoolListing::Listed { entry_id: MapPoolEntryId(7), .. }
        ));
    }

    #[test]
    fn test_maps_without_entries_are_unlisted_and_sorted() {
        let snapshot = LeagueSnapshot {
            maps: maps(&["Overpass", "Anubis"]),
            ..Default::default()
        };

        let rows = map_pool_status(&snapshot, date(2024, 1, 1));
        assert_eq!(rows[0].map_name, "Anubis");
        assert!(rows.iter().all(|r| r.listing == MapPoolListing::Unlisted));
    }
}
