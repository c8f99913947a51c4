//! Win rates by game length.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::{safe_ratio, saturating_buckets, StatsError, Tally};
use crate::models::ArchetypeFilter;
use crate::storage::StatsStore;

/// Games lasting this many turns or fewer share one bucket.
pub const MIN_TURNS: u32 = 4;

/// Games lasting this many turns or more share one bucket.
pub const MAX_TURNS: u32 = 16;

/// One turn-count bucket of an archetype's record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthBucket {
    pub turns: u32,
    pub wins: u64,
    pub games: u64,
    pub win_rate: f64,
    /// Share of all games that lasted this long.
    pub game_length_rate: f64,
}

/// For each game length, the filtered archetype's record, win rate, and how
/// frequently games last that long. Lengths at or below [`MIN_TURNS`] and at
/// or above [`MAX_TURNS`] are grouped together. A set with no rows still
/// yields the full zero-filled bucket range.
pub fn record_by_length(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<LengthBucket>, StatsError> {
    let rows = store.arch_game_stats(set_abbr, filter)?;
    debug!("record_by_length: {} raw rows for {}", rows.len(), filter.label());

    let mut by_turns: BTreeMap<u32, Tally> = BTreeMap::new();
    for row in &rows {
        let tally = by_turns.entry(row.turns).or_default();
        let wins = if row.won { row.game_count } else { 0 };
        tally.add(wins, row.game_count);
    }

    let dense = saturating_buckets(&by_turns, MIN_TURNS, MAX_TURNS);
    let total_games: u64 = dense.values().map(|t| t.games).sum();

    Ok(dense
        .into_iter()
        .map(|(turns, tally)| LengthBucket {
            turns,
            wins: tally.wins,
            games: tally.games,
            win_rate: tally.win_rate(),
            game_length_rate: safe_ratio(tally.games, total_games),
        })
        .collect())
}
