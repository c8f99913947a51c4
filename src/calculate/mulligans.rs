//! Win rates by mulligan count, and play/draw splits.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{round4, safe_ratio, StatsError, Tally};
use crate::models::{ArchId, ArchetypeFilter};
use crate::storage::StatsStore;

/// Mulligan counts of 3 or more are pre-aggregated upstream into this bucket.
pub const MAX_MULLIGANS: u32 = 3;

/// One mulligan count's record, split by play/draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MulliganRow {
    pub mulligans: u32,
    pub games_on_play: u64,
    pub wr_on_play: f64,
    pub games_on_draw: u64,
    pub wr_on_draw: f64,
    pub games_total: u64,
    pub wr_total: f64,
}

/// Win rates on the play, on the draw, and overall by number of mulligans
/// taken, for one archetype or summed over all of them.
///
/// Unlike the sparse turn-length fold, the upstream writer guarantees dense
/// `(mulligans, on_play)` coverage; an absent key means that contract was
/// violated and is reported as [`StatsError::MissingMulliganRow`] rather than
/// treated as zero.
pub fn win_rates_by_mulligans(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<MulliganRow>, StatsError> {
    let rows = store.arch_start_stats(set_abbr, filter)?;

    // Sum across archetypes first; the dense check applies to the summed map.
    let mut by_key: BTreeMap<(u32, bool), Tally> = BTreeMap::new();
    for row in &rows {
        by_key
            .entry((row.num_mulligans, row.on_play))
            .or_default()
            .add(row.win_count, row.game_count);
    }

    let lookup = |mulligans: u32, on_play: bool| -> Result<Tally, StatsError> {
        by_key
            .get(&(mulligans, on_play))
            .copied()
            .ok_or(StatsError::MissingMulliganRow { mulligans, on_play })
    };

    let mut output = Vec::with_capacity((MAX_MULLIGANS + 1) as usize);
    for mulligans in 0..=MAX_MULLIGANS {
        let play = lookup(mulligans, true)?;
        let draw = lookup(mulligans, false)?;
        let games_total = play.games + draw.games;
        let wins_total = play.wins + draw.wins;
        output.push(MulliganRow {
            mulligans,
            games_on_play: play.games,
            wr_on_play: round4(play.win_rate()),
            games_on_draw: draw.games,
            wr_on_draw: round4(draw.win_rate()),
            games_total,
            wr_total: round4(safe_ratio(wins_total, games_total)),
        });
    }
    Ok(output)
}

/// One archetype's record split by who went first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayDrawSplit {
    pub label: String,
    pub games_on_play: u64,
    pub wr_on_play: f64,
    pub games_on_draw: u64,
    pub wr_on_draw: f64,
}

/// Games played and win rate on the play and on the draw for each archetype
/// with start-stats rows, ordered by archetype id and labeled via the codec.
/// A side with no rows counts as zero games.
pub fn play_draw_splits(
    store: &dyn StatsStore,
    set_abbr: &str,
) -> Result<Vec<PlayDrawSplit>, StatsError> {
    let rows = store.arch_start_stats(set_abbr, &ArchetypeFilter::All)?;

    let mut by_key: BTreeMap<(ArchId, bool), Tally> = BTreeMap::new();
    for row in &rows {
        by_key
            .entry((row.arch_id, row.on_play))
            .or_default()
            .add(row.win_count, row.game_count);
    }

    let mut arch_ids: Vec<ArchId> = by_key.keys().map(|(id, _)| *id).collect();
    arch_ids.sort_unstable();
    arch_ids.dedup();

    Ok(arch_ids
        .into_iter()
        .map(|arch_id| {
            let play = by_key.get(&(arch_id, true)).copied().unwrap_or_default();
            let draw = by_key.get(&(arch_id, false)).copied().unwrap_or_default();
            PlayDrawSplit {
                label: arch_id.label(),
                games_on_play: play.games,
                wr_on_play: play.win_rate(),
                games_on_draw: draw.games,
                wr_on_draw: draw.win_rate(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArchStartRow;
    use crate::storage::MemoryStore;

    fn row(arch: &str, mulligans: u32, on_play: bool, wins: u64, games: u64) -> ArchStartRow {
        ArchStartRow {
            arch_id: ArchId::from_label(arch).unwrap(),
            num_mulligans: mulligans,
            on_play,
            win_count: wins,
            game_count: games,
        }
    }

    /// Dense rows for one archetype, zero-filled above mulligan count 0.
    fn dense_rows(arch: &str, wins_draw: u64, games_draw: u64, wins_play: u64, games_play: u64) -> Vec<ArchStartRow> {
        let mut rows = vec![
            row(arch, 0, false, wins_draw, games_draw),
            row(arch, 0, true, wins_play, games_play),
        ];
        for mulligans in 1..=MAX_MULLIGANS {
            rows.push(row(arch, mulligans, false, 0, 0));
            rows.push(row(arch, mulligans, true, 0, 0));
        }
        rows
    }

    #[test]
    fn test_mulligan_row_zero() {
        let mut store = MemoryStore::new();
        store.arch_start_stats = dense_rows("WU", 10, 20, 15, 20);

        let table = win_rates_by_mulligans(&store, "dsk", &ArchetypeFilter::All).unwrap();
        assert_eq!(table.len(), 4);

        let first = &table[0];
        assert_eq!(first.mulligans, 0);
        assert_eq!(first.games_on_draw, 20);
        assert_eq!(first.wr_on_draw, 0.5);
        assert_eq!(first.games_on_play, 20);
        assert_eq!(first.wr_on_play, 0.75);
        assert_eq!(first.games_total, 40);
        assert_eq!(first.wr_total, 0.625);
    }

    #[test]
    fn test_zero_filled_rows_yield_zero_rates() {
        let mut store = MemoryStore::new();
        store.arch_start_stats = dense_rows("WU", 10, 20, 15, 20);

        let table = win_rates_by_mulligans(&store, "dsk", &ArchetypeFilter::All).unwrap();
        for mulligan_row in &table[1..] {
            assert_eq!(mulligan_row.games_total, 0);
            assert_eq!(mulligan_row.wr_total, 0.0);
        }
    }

    #[test]
    fn test_missing_dense_row_is_an_error() {
        let mut store = MemoryStore::new();
        // Only mulligan 0 present: the writer contract was violated.
        store.arch_start_stats = vec![row("WU", 0, false, 5, 10), row("WU", 0, true, 6, 10)];

        let err = win_rates_by_mulligans(&store, "dsk", &ArchetypeFilter::All).unwrap_err();
        match err {
            StatsError::MissingMulliganRow { mulligans, on_play } => {
                assert_eq!(mulligans, 1);
                assert!(!on_play);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_all_filter_sums_across_archetypes() {
        let mut store = MemoryStore::new();
        let mut rows = dense_rows("WU", 10, 20, 15, 20);
        rows.extend(dense_rows("BR", 10, 20, 5, 20));
        store.arch_start_stats = rows;

        let table = win_rates_by_mulligans(&store, "dsk", &ArchetypeFilter::All).unwrap();
        let first = &table[0];
        assert_eq!(first.games_total, 80);
        assert_eq!(first.wr_on_play, 0.5); // (15 + 5) / 40
    }

    #[test]
    fn test_rounding_to_four_places() {
        let mut store = MemoryStore::new();
        store.arch_start_stats = dense_rows("WU", 1, 3, 0, 0);

        let table = win_rates_by_mulligans(&store, "dsk", &ArchetypeFilter::All).unwrap();
        assert_eq!(table[0].wr_on_draw, 0.3333);
    }

    #[test]
    fn test_play_draw_splits_ordered_and_labeled() {
        let mut store = MemoryStore::new();
        store.arch_start_stats = vec![
            // Stored out of id order.
            row("BR", 0, true, 8, 16),
            row("BR", 1, false, 4, 8),
            row("WU", 0, true, 6, 10),
            row("WU", 0, false, 4, 10),
        ];

        let splits = play_draw_splits(&store, "dsk").unwrap();
        assert_eq!(splits.len(), 2);
        // WU (id 3) before BR (id 12).
        assert_eq!(splits[0].label, "WU");
        assert_eq!(splits[0].games_on_play, 10);
        assert_eq!(splits[0].wr_on_play, 0.6);
        assert_eq!(splits[0].wr_on_draw, 0.4);

        assert_eq!(splits[1].label, "BR");
        // Mulligan counts are summed per side.
        assert_eq!(splits[1].games_on_play, 16);
        assert_eq!(splits[1].games_on_draw, 8);
    }

    #[test]
    fn test_play_draw_splits_missing_side_is_zero() {
        let mut store = MemoryStore::new();
        store.arch_start_stats = vec![row("WU", 0, true, 6, 10)];

        let splits = play_draw_splits(&store, "dsk").unwrap();
        assert_eq!(splits[0].games_on_draw, 0);
        assert_eq!(splits[0].wr_on_draw, 0.0);
    }
}
