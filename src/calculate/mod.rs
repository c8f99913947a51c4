//! Statistical derivation engine.
//!
//! Turns the raw per-set counter tables into normalized metrics:
//! - Win rates by game length, mulligan count, and copy count
//! - Curve, speed, and aggression signals per archetype
//! - Per-card tables (GPWR, GIHWR, mean pick order)
//! - Meta distribution and mean decklists
//! - The format overview table
//!
//! All derivations are pure functions of the rows they fetch through a
//! [`StatsStore`] handle; sparse samples resolve to zero-valued metrics via
//! [`safe_ratio`], never to NaN or an error.

pub mod cards;
pub mod decklists;
pub mod length;
pub mod mulligans;
pub mod overview;
pub mod speed;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{ArchetypeError, SetInfo};
use crate::storage::{StatsStore, StorageError};

/// Errors from the derivation layer.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Archetype(#[from] ArchetypeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown card name: {0}")]
    UnknownCard(String),

    #[error("Missing mulligan row: {mulligans} mulligans, on_play={on_play}")]
    MissingMulliganRow { mulligans: u32, on_play: bool },
}

/// Divide, substituting 1 for a zero denominator.
///
/// A zero-game bucket always has zero wins, so the substitution yields 0
/// rather than NaN while leaving nonzero samples untouched.
pub fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}

/// Same guard for f64 sums.
pub fn safe_ratio_f64(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(1.0)
}

/// Round to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A wins/games pair accumulated while folding counter rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: u64,
    pub games: u64,
}

impl Tally {
    pub fn add(&mut self, wins: u64, games: u64) {
        self.wins += wins;
        self.games += games;
    }

    pub fn win_rate(&self) -> f64 {
        safe_ratio(self.wins, self.games)
    }
}

/// Fold sparse keyed tallies into the dense range `low..=high`, saturating
/// at both ends: keys below `low` merge into the `low` bucket and keys above
/// `high` merge into the `high` bucket. Keys inside the range with no input
/// contribute zero.
///
/// Shared by the turn-length buckets (4..=16) and the copy-count buckets
/// (1..=4).
pub fn saturating_buckets(
    sparse: &BTreeMap<u32, Tally>,
    low: u32,
    high: u32,
) -> BTreeMap<u32, Tally> {
    let mut dense: BTreeMap<u32, Tally> = (low..=high).map(|k| (k, Tally::default())).collect();
    for (&key, tally) in sparse {
        let bucket = key.clamp(low, high);
        let slot = dense.entry(bucket).or_default();
        slot.add(tally.wins, tally.games);
    }
    dense
}

/// List the active sets from the registry.
pub fn active_sets(store: &dyn StatsStore) -> Result<Vec<SetInfo>, StatsError> {
    Ok(store.sets()?)
}

/// The most recent set by release date, if any are registered.
pub fn most_recent_set(store: &dyn StatsStore) -> Result<Option<SetInfo>, StatsError> {
    let sets = store.sets()?;
    Ok(sets.into_iter().max_by_key(|s| s.release_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(5, 10), 0.5);
        assert_eq!(safe_ratio(0, 0), 0.0);
        assert_eq!(safe_ratio(3, 0), 3.0); // numerator untouched
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.625), 0.625);
        assert_eq!(round4(0.0), 0.0);
    }

    #[test]
    fn test_tally_win_rate() {
        let mut tally = Tally::default();
        assert_eq!(tally.win_rate(), 0.0);
        tally.add(3, 6);
        tally.add(2, 4);
        assert_eq!(tally.win_rate(), 0.5);
    }

    #[test]
    fn test_saturating_buckets_merges_tails() {
        let sparse = BTreeMap::from([
            (1, Tally { wins: 1, games: 2 }),
            (4, Tally { wins: 2, games: 3 }),
            (8, Tally { wins: 5, games: 10 }),
            (16, Tally { wins: 1, games: 4 }),
            (20, Tally { wins: 0, games: 1 }),
        ]);

        let dense = saturating_buckets(&sparse, 4, 16);

        assert_eq!(dense.len(), 13);
        assert_eq!(dense[&4], Tally { wins: 3, games: 5 });
        assert_eq!(dense[&8], Tally { wins: 5, games: 10 });
        assert_eq!(dense[&16], Tally { wins: 1, games: 5 });
        assert_eq!(dense[&10], Tally::default());
    }

    #[test]
    fn test_saturating_buckets_preserves_total_games() {
        let sparse = BTreeMap::from([
            (2, Tally { wins: 3, games: 7 }),
            (9, Tally { wins: 4, games: 9 }),
            (30, Tally { wins: 2, games: 5 }),
        ]);
        let dense = saturating_buckets(&sparse, 4, 16);

        let raw_total: u64 = sparse.values().map(|t| t.games).sum();
        let dense_total: u64 = dense.values().map(|t| t.games).sum();
        assert_eq!(raw_total, dense_total);
    }

    #[test]
    fn test_saturating_buckets_empty_input_emits_skeleton() {
        let dense = saturating_buckets(&BTreeMap::new(), 4, 16);
        assert_eq!(dense.len(), 13);
        assert!(dense.values().all(|t| *t == Tally::default()));
    }

    fn registry_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.sets = vec![
            SetInfo::new(
                "blb",
                "Bloomburrow",
                NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
            ),
            SetInfo::new(
                "dsk",
                "Duskmourn",
                NaiveDate::from_ymd_opt(2024, 9, 27).unwrap(),
            ),
        ];
        store
    }

    #[test]
    fn test_active_sets() {
        let store = registry_store();
        let sets = active_sets(&store).unwrap();
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn test_most_recent_set() {
        let store = registry_store();
        let latest = most_recent_set(&store).unwrap().unwrap();
        assert_eq!(latest.set_abbr, "dsk");
    }

    #[test]
    fn test_most_recent_set_empty_registry() {
        let store = MemoryStore::new();
        assert!(most_recent_set(&store).unwrap().is_none());
    }
}
