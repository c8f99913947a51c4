//! Archetype speed, curve, and mana-value averages.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{safe_ratio, safe_ratio_f64, StatsError, Tally};
use crate::models::{ArchetypeFilter, ManaCurve, CURVE_BUCKETS};
use crate::storage::StatsStore;

/// Average game lengths and the derived speed signal for one archetype.
///
/// Speed is the difference between average win and loss length; a negative
/// value means the archetype wins its fast games. Totals are carried for
/// sample-size cutoffs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeedRecord {
    pub average_win_length: f64,
    pub average_loss_length: f64,
    pub average_game_length: f64,
    pub wins: u64,
    pub losses: u64,
    pub games: u64,
    pub speed: f64,
}

/// Fold `(turns, won)` rows into per-turn tallies over the full observed
/// range, with no tail merging.
pub(crate) fn tallies_by_turn(rows: &[(u32, bool, u64)]) -> BTreeMap<u32, Tally> {
    let mut by_turn: BTreeMap<u32, Tally> = BTreeMap::new();
    for &(turns, won, game_count) in rows {
        let tally = by_turn.entry(turns).or_default();
        tally.add(if won { game_count } else { 0 }, game_count);
    }
    by_turn
}

/// Derive a [`SpeedRecord`] from per-turn tallies. Zero input yields the
/// all-zero record, speed included.
pub(crate) fn speed_from_tallies(by_turn: &BTreeMap<u32, Tally>) -> SpeedRecord {
    let mut win_turns = 0u64;
    let mut loss_turns = 0u64;
    let mut game_turns = 0u64;
    let mut wins = 0u64;
    let mut losses = 0u64;
    let mut games = 0u64;

    for (&turns, tally) in by_turn {
        let turn_losses = tally.games - tally.wins;
        win_turns += turns as u64 * tally.wins;
        loss_turns += turns as u64 * turn_losses;
        game_turns += turns as u64 * tally.games;
        wins += tally.wins;
        losses += turn_losses;
        games += tally.games;
    }

    let average_win_length = safe_ratio(win_turns, wins);
    let average_loss_length = safe_ratio(loss_turns, losses);
    SpeedRecord {
        average_win_length,
        average_loss_length,
        average_game_length: safe_ratio(game_turns, games),
        wins,
        losses,
        games,
        speed: average_win_length - average_loss_length,
    }
}

/// Average speed for a filtered archetype, from its full turn histogram.
pub fn average_speed(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<SpeedRecord, StatsError> {
    let rows = store.arch_game_stats(set_abbr, filter)?;
    let triples: Vec<(u32, bool, u64)> = rows
        .iter()
        .map(|r| (r.turns, r.won, r.game_count))
        .collect();
    Ok(speed_from_tallies(&tallies_by_turn(&triples)))
}

/// Mean card counts per mana-value bucket for a filtered archetype.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageCurve {
    pub lands: f64,
    pub drops: [f64; CURVE_BUCKETS],
}

fn summed_curve(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<(ManaCurve, u64), StatsError> {
    let rows = store.arch_game_stats(set_abbr, filter)?;
    let mut total = ManaCurve::default();
    let mut games = 0u64;
    for row in &rows {
        total.add(&row.curve);
        games += row.game_count;
    }
    Ok((total, games))
}

/// Mean lands and n-drops per deck for the filtered archetype. Zero games
/// yields all zeros.
pub fn average_curve(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<AverageCurve, StatsError> {
    let (total, games) = summed_curve(store, set_abbr, filter)?;
    let mut curve = AverageCurve {
        lands: safe_ratio(total.lands, games),
        ..AverageCurve::default()
    };
    for (slot, count) in curve.drops.iter_mut().zip(total.drops.iter()) {
        *slot = safe_ratio(*count, games);
    }
    Ok(curve)
}

/// Mean mana value of the filtered archetype's decks: card counts weighted
/// by their mana-value bucket, lands weighing zero. Zero games (or an empty
/// curve) yields 0.
pub fn average_mana_value(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
    include_lands: bool,
) -> Result<f64, StatsError> {
    let (total, _games) = summed_curve(store, set_abbr, filter)?;

    let weighted: u64 = total
        .drops
        .iter()
        .enumerate()
        .map(|(mana_value, count)| mana_value as u64 * count)
        .sum();
    let mut card_count: u64 = total.drops.iter().sum();
    if include_lands {
        card_count += total.lands;
    }
    Ok(safe_ratio_f64(weighted as f64, card_count as f64))
}
