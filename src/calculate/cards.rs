//! Per-card metric assemblers.
//!
//! These pipelines share one join pattern: fetch a counter table under an
//! archetype filter, re-key by card name through the card identity table,
//! then attach safe-divided ratios.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::{safe_ratio, saturating_buckets, StatsError, Tally};
use crate::models::{ArchetypeError, ArchetypeFilter, Card, ColorMask};
use crate::storage::StatsStore;

/// Copy counts of 4 or more share one bucket.
pub const MAX_COPIES_BUCKET: u32 = 4;

fn cards_by_id(store: &dyn StatsStore, set_abbr: &str) -> Result<BTreeMap<u32, Card>, StatsError> {
    Ok(store
        .cards(set_abbr)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

/// Games-played win rate for one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardWinRate {
    pub card_id: u32,
    pub name: String,
    pub wins: u64,
    pub games_played: u64,
    pub win_rate: f64,
}

/// Games-played win rates for all cards with counter rows, optionally
/// restricted to decks of one archetype and to an inclusive range of copies.
/// Rows are ordered by card id.
pub fn in_deck_win_rates(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
    min_copies: u32,
    max_copies: u32,
) -> Result<Vec<CardWinRate>, StatsError> {
    let cards = cards_by_id(store, set_abbr)?;
    let rows = store.card_game_stats(set_abbr, filter)?;

    let mut by_card: BTreeMap<u32, Tally> = BTreeMap::new();
    for row in &rows {
        if row.copies < min_copies || row.copies > max_copies {
            continue;
        }
        by_card
            .entry(row.card_id)
            .or_default()
            .add(row.win_count, row.game_count);
    }

    let mut output = Vec::with_capacity(by_card.len());
    for (card_id, tally) in by_card {
        let Some(card) = cards.get(&card_id) else {
            warn!("card_game_stats row references unknown card id {}", card_id);
            continue;
        };
        output.push(CardWinRate {
            card_id,
            name: card.name.clone(),
            wins: tally.wins,
            games_played: tally.games,
            win_rate: tally.win_rate(),
        });
    }
    Ok(output)
}

/// One copy-count bucket of a card's record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CopiesBucket {
    pub copies: u32,
    pub wins: u64,
    pub games: u64,
    pub win_rate: f64,
}

/// Wins, games, and win rate for a named card split by how many copies the
/// deck ran. Copy counts of 4 or more merge into one bucket, and the win
/// rate divides by the post-merge games sum. Unknown names are an error.
pub fn record_by_copies(
    store: &dyn StatsStore,
    set_abbr: &str,
    card_name: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<CopiesBucket>, StatsError> {
    let card_id = store
        .cards(set_abbr)?
        .iter()
        .find(|c| c.name == card_name)
        .map(|c| c.id)
        .ok_or_else(|| StatsError::UnknownCard(card_name.to_string()))?;

    let rows = store.card_game_stats(set_abbr, filter)?;
    let mut by_copies: BTreeMap<u32, Tally> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.card_id == card_id) {
        by_copies
            .entry(row.copies)
            .or_default()
            .add(row.win_count, row.game_count);
    }

    let dense = saturating_buckets(&by_copies, 1, MAX_COPIES_BUCKET);
    Ok(dense
        .into_iter()
        .map(|(copies, tally)| CopiesBucket {
            copies,
            wins: tally.wins,
            games: tally.games,
            win_rate: tally.win_rate(),
        })
        .collect())
}

/// Games-in-hand win rate for one card, with the sample size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InHandWinRate {
    pub card_id: u32,
    pub name: String,
    pub games_in_hand: u64,
    pub win_rate: f64,
}

/// Games-in-hand win rates, surfaced from the precomputed per-card rows.
/// The raw win count is dropped; the sample size stays.
pub fn games_in_hand_win_rates(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<InHandWinRate>, StatsError> {
    let cards = cards_by_id(store, set_abbr)?;
    let rows = store.card_derived_stats(set_abbr, filter)?;

    let mut output = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(card) = cards.get(&row.card_id) else {
            warn!("card_derived_stats row references unknown card id {}", row.card_id);
            continue;
        };
        output.push(InHandWinRate {
            card_id: row.card_id,
            name: card.name.clone(),
            games_in_hand: row.games_in_hand,
            win_rate: safe_ratio(row.wins_in_hand, row.games_in_hand),
        });
    }
    output.sort_by_key(|r| r.card_id);
    Ok(output)
}

/// Average win shares for one card, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinShares {
    pub card_id: u32,
    pub name: String,
    pub games_in_hand: u64,
    pub avg_win_shares: f64,
}

/// Average win shares per appearance, surfaced from the precomputed rows.
pub fn average_win_shares(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<WinShares>, StatsError> {
    let cards = cards_by_id(store, set_abbr)?;
    let rows = store.card_derived_stats(set_abbr, filter)?;

    let mut output = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(card) = cards.get(&row.card_id) else {
            warn!("card_derived_stats row references unknown card id {}", row.card_id);
            continue;
        };
        output.push(WinShares {
            card_id: row.card_id,
            name: card.name.clone(),
            games_in_hand: row.games_in_hand,
            avg_win_shares: row.avg_win_shares,
        });
    }
    output.sort_by_key(|r| r.card_id);
    Ok(output)
}

/// A card's mean pick order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanPick {
    pub name: String,
    pub mean_pick: f64,
}

/// Fold pack rows into per-card, per-pick counts summed across packs.
fn pick_counts_by_card(
    store: &dyn StatsStore,
    set_abbr: &str,
) -> Result<BTreeMap<String, BTreeMap<u32, u64>>, StatsError> {
    let rows = store.draft_packs(set_abbr)?;
    let mut by_card: BTreeMap<String, BTreeMap<u32, u64>> = BTreeMap::new();
    for row in &rows {
        for (name, count) in &row.counts {
            *by_card
                .entry(name.clone())
                .or_default()
                .entry(row.pick_number)
                .or_default() += count;
        }
    }
    Ok(by_card)
}

/// Mean pick order per card: the pick-number-weighted sum of appearance
/// counts, normalized by the card's peak per-pick frequency. This is a
/// deliberate departure from a plain weighted average; the peak-frequency
/// denominator materially changes the metric.
pub fn mean_pick_order(
    store: &dyn StatsStore,
    set_abbr: &str,
) -> Result<Vec<MeanPick>, StatsError> {
    let by_card = pick_counts_by_card(store, set_abbr)?;
    Ok(by_card
        .into_iter()
        .map(|(name, picks)| {
            let weighted: u64 = picks.iter().map(|(&pick, &count)| pick as u64 * count).sum();
            let peak: u64 = picks.values().copied().max().unwrap_or(0);
            MeanPick {
                name,
                mean_pick: safe_ratio(weighted, peak),
            }
        })
        .collect())
}

/// Names of cards matching a single color letter (`W/U/B/R/G/C`).
///
/// `include_multicolor` selects any card containing the color instead of
/// exactly that color. Lands are stored colorless and only appear for `C`
/// when `include_lands` is set.
pub fn cards_with_color(
    store: &dyn StatsStore,
    set_abbr: &str,
    color: char,
    include_multicolor: bool,
    include_lands: bool,
) -> Result<Vec<String>, StatsError> {
    let upper = color.to_ascii_uppercase();
    let mask = match upper {
        'C' => ColorMask::COLORLESS,
        'W' | 'U' | 'B' | 'R' | 'G' => ColorMask::from_letters(&upper.to_string())?,
        other => return Err(ArchetypeError::UnknownColor(other).into()),
    };

    let cards = store.cards(set_abbr)?;
    Ok(cards
        .into_iter()
        .filter(|card| {
            if mask.is_colorless() {
                card.color.is_colorless() && (include_lands || !card.is_land())
            } else if include_multicolor {
                card.color.contains(mask)
            } else {
                card.color == mask
            }
        })
        .map(|card| card.name)
        .collect())
}

/// One row of the composite per-card table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTableRow {
    pub id: u32,
    pub name: String,
    pub color: ColorMask,
    pub rarity: String,
    #[serde(rename = "GPWR")]
    pub gpwr: f64,
    pub games_played: u64,
    pub mean_pick: f64,
    pub games_in_hand: u64,
    #[serde(rename = "GIHWR")]
    pub gihwr: f64,
    #[serde(rename = "adjusted_IWD")]
    pub adjusted_iwd: f64,
    pub inclusion_impact: f64,
}

/// The composite per-card table: identity joined with GPWR, mean pick order,
/// and the precomputed in-hand signals, all under one archetype filter.
/// Cards with no counter rows get zero-valued metrics.
pub fn card_table(
    store: &dyn StatsStore,
    set_abbr: &str,
    filter: &ArchetypeFilter,
) -> Result<Vec<CardTableRow>, StatsError> {
    let mut cards = store.cards(set_abbr)?;
    cards.sort_by_key(|c| c.id);

    let mut game_tallies: BTreeMap<u32, Tally> = BTreeMap::new();
    for row in store.card_game_stats(set_abbr, filter)? {
        game_tallies
            .entry(row.card_id)
            .or_default()
            .add(row.win_count, row.game_count);
    }

    let pick_counts = pick_counts_by_card(store, set_abbr)?;

    let derived: BTreeMap<u32, crate::models::CardDerivedRow> = store
        .card_derived_stats(set_abbr, filter)?
        .into_iter()
        .map(|row| (row.card_id, row))
        .collect();

    Ok(cards
        .into_iter()
        .map(|card| {
            let tally = game_tallies.get(&card.id).copied().unwrap_or_default();
            let mean_pick = pick_counts
                .get(&card.name)
                .map(|picks| {
                    let weighted: u64 =
                        picks.iter().map(|(&pick, &count)| pick as u64 * count).sum();
                    let peak = picks.values().copied().max().unwrap_or(0);
                    safe_ratio(weighted, peak)
                })
                .unwrap_or(0.0);
            let (games_in_hand, gihwr, adjusted_iwd, inclusion_impact) = derived
                .get(&card.id)
                .map(|d| {
                    (
                        d.games_in_hand,
                        safe_ratio(d.wins_in_hand, d.games_in_hand),
                        d.adjusted_iwd,
                        d.inclusion_impact,
                    )
                })
                .unwrap_or((0, 0.0, 0.0, 0.0));

            CardTableRow {
                id: card.id,
                name: card.name,
                color: card.color,
                rarity: card.rarity,
                gpwr: tally.win_rate(),
                games_played: tally.games,
                mean_pick,
                games_in_hand,
                gihwr,
                adjusted_iwd,
                inclusion_impact,
            }
        })
        .collect())
}
