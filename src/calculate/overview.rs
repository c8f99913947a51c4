//! Archetype records and the format overview table.

use std::collections::BTreeMap;

use serde::Serialize;

use super::speed::{speed_from_tallies, tallies_by_turn};
use super::{safe_ratio, safe_ratio_f64, StatsError};
use crate::models::{ArchId, ArchetypeFilter, ColorMask, CANONICAL_ORDER};
use crate::storage::StatsStore;

/// One archetype's stored totals with derived rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeRecord {
    pub label: String,
    pub num_drafts: u64,
    pub num_wins: u64,
    pub num_losses: u64,
    pub num_games: u64,
    pub win_rate: f64,
}

/// Totals and win rate for one archetype. A valid id with no stored row
/// yields an all-zero record.
pub fn archetype_record(
    store: &dyn StatsStore,
    set_abbr: &str,
    arch_id: ArchId,
) -> Result<ArchetypeRecord, StatsError> {
    let archetypes = store.archetypes(set_abbr)?;
    let (num_drafts, num_wins, num_losses) = archetypes
        .iter()
        .find(|a| a.id == arch_id)
        .map(|a| (a.num_drafts, a.num_wins, a.num_losses))
        .unwrap_or((0, 0, 0));

    let num_games = num_wins + num_losses;
    Ok(ArchetypeRecord {
        label: arch_id.label(),
        num_drafts,
        num_wins,
        num_losses,
        num_games,
        win_rate: safe_ratio(num_wins, num_games),
    })
}

/// An `(id, label)` pair from the archetype table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeLabel {
    pub id: ArchId,
    pub label: String,
}

/// The archetypes that exist for a set, in id order. If WU was split, the
/// result contains "WU" plus "WU1".."WUn"; an unsplit BRG appears alone.
/// `main_colors` restricts to one base color combination.
pub fn archetype_labels(
    store: &dyn StatsStore,
    set_abbr: &str,
    main_colors: Option<&str>,
) -> Result<Vec<ArchetypeLabel>, StatsError> {
    let mask = main_colors.map(ColorMask::from_letters).transpose()?;

    let mut archetypes = store.archetypes(set_abbr)?;
    archetypes.sort_by_key(|a| a.id);
    Ok(archetypes
        .into_iter()
        .filter(|a| mask.map_or(true, |m| a.id.color_mask() == m))
        .map(|a| ArchetypeLabel {
            id: a.id,
            label: a.id.label(),
        })
        .collect())
}

/// One row of the format overview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewRow {
    pub label: String,
    pub num_drafts: u64,
    pub num_games: u64,
    pub win_rate: f64,
    pub average_win_length: f64,
    pub average_game_length: f64,
    /// Average loss length minus average win length; positive means the
    /// archetype wins its fast games.
    pub aggression: f64,
}

/// The format overview: every base archetype plus a synthetic ALL aggregate,
/// with totals, win rate, and speed metrics, in the fixed canonical 33-row
/// order.
///
/// The ALL row's counts are straight sums; its length metrics are weighted
/// averages over the per-archetype values — win and game length weighted by
/// each archetype's win count, loss length by its loss count — rather than a
/// fresh aggregation over raw rows.
pub fn format_overview(
    store: &dyn StatsStore,
    set_abbr: &str,
) -> Result<Vec<OverviewRow>, StatsError> {
    let archetypes = store.archetypes(set_abbr)?;
    let totals: BTreeMap<u8, (u64, u64, u64)> = archetypes
        .iter()
        .filter(|a| a.id.is_base())
        .map(|a| (a.id.raw(), (a.num_drafts, a.num_wins, a.num_losses)))
        .collect();

    let game_rows = store.arch_game_stats(set_abbr, &ArchetypeFilter::All)?;
    let mut turn_rows: BTreeMap<u8, Vec<(u32, bool, u64)>> = BTreeMap::new();
    for row in &game_rows {
        if row.arch_id.is_base() {
            turn_rows
                .entry(row.arch_id.raw())
                .or_default()
                .push((row.turns, row.won, row.game_count));
        }
    }

    struct BaseRow {
        num_drafts: u64,
        num_wins: u64,
        num_losses: u64,
        win_length: f64,
        loss_length: f64,
        game_length: f64,
    }

    let mut by_label: BTreeMap<String, BaseRow> = BTreeMap::new();
    for raw in 0..32u16 {
        let arch_id = ArchId::new(raw)?;
        let (num_drafts, num_wins, num_losses) =
            totals.get(&arch_id.raw()).copied().unwrap_or((0, 0, 0));
        // Archetypes with no turn rows keep zero length metrics but still
        // contribute their totals.
        let speed = turn_rows
            .get(&arch_id.raw())
            .map(|rows| speed_from_tallies(&tallies_by_turn(rows)))
            .unwrap_or_default();
        by_label.insert(
            arch_id.label(),
            BaseRow {
                num_drafts,
                num_wins,
                num_losses,
                win_length: speed.average_win_length,
                loss_length: speed.average_loss_length,
                game_length: speed.average_game_length,
            },
        );
    }

    let total_wins: u64 = by_label.values().map(|r| r.num_wins).sum();
    let total_losses: u64 = by_label.values().map(|r| r.num_losses).sum();
    let all_win_length = safe_ratio_f64(
        by_label
            .values()
            .map(|r| r.win_length * r.num_wins as f64)
            .sum(),
        total_wins as f64,
    );
    let all_game_length = safe_ratio_f64(
        by_label
            .values()
            .map(|r| r.game_length * r.num_wins as f64)
            .sum(),
        total_wins as f64,
    );
    let all_loss_length = safe_ratio_f64(
        by_label
            .values()
            .map(|r| r.loss_length * r.num_losses as f64)
            .sum(),
        total_losses as f64,
    );

    let all_row = OverviewRow {
        label: "ALL".to_string(),
        num_drafts: by_label.values().map(|r| r.num_drafts).sum(),
        num_games: total_wins + total_losses,
        win_rate: safe_ratio(total_wins, total_wins + total_losses),
        average_win_length: all_win_length,
        average_game_length: all_game_length,
        aggression: all_loss_length - all_win_length,
    };

    let mut output = Vec::with_capacity(CANONICAL_ORDER.len());
    for &label in &CANONICAL_ORDER {
        if label == "ALL" {
            output.push(all_row.clone());
            continue;
        }
        let row = &by_label[label];
        let num_games = row.num_wins + row.num_losses;
        output.push(OverviewRow {
            label: label.to_string(),
            num_drafts: row.num_drafts,
            num_games,
            win_rate: safe_ratio(row.num_wins, num_games),
            average_win_length: row.win_length,
            average_game_length: row.game_length,
            aggression: row.loss_length - row.win_length,
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchGameRow, Archetype, ManaCurve};
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn archetype(label: &str, drafts: u64, wins: u64, losses: u64) -> Archetype {
        Archetype::new(ArchId::from_label(label).unwrap(), drafts, wins, losses)
    }

    fn game_row(arch: &str, turns: u32, won: bool, game_count: u64) -> ArchGameRow {
        ArchGameRow {
            arch_id: ArchId::from_label(arch).unwrap(),
            turns,
            won,
            game_count,
            curve: ManaCurve::default(),
        }
    }

    #[test]
    fn test_archetype_record() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![archetype("WU", 100, 250, 150)];

        let record =
            archetype_record(&store, "dsk", ArchId::from_label("WU").unwrap()).unwrap();
        assert_eq!(record.label, "WU");
        assert_eq!(record.num_games, 400);
        assert_eq!(record.win_rate, 0.625);
    }

    #[test]
    fn test_archetype_record_missing_row_is_zero() {
        let store = MemoryStore::new();
        let record =
            archetype_record(&store, "dsk", ArchId::from_label("BR").unwrap()).unwrap();
        assert_eq!(record.label, "BR");
        assert_eq!(record.num_games, 0);
        assert_eq!(record.win_rate, 0.0);
    }

    #[test]
    fn test_archetype_labels_includes_subdivisions() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![
            archetype("WU2", 10, 20, 15),
            archetype("WU", 100, 250, 150),
            archetype("BRG", 50, 90, 80),
            archetype("WU1", 12, 25, 20),
        ];

        let labels = archetype_labels(&store, "dsk", None).unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["WU", "BRG", "WU1", "WU2"]);
    }

    #[test]
    fn test_archetype_labels_restricted_to_colors() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![
            archetype("WU", 100, 250, 150),
            archetype("WU1", 12, 25, 20),
            archetype("BRG", 50, 90, 80),
        ];

        let labels = archetype_labels(&store, "dsk", Some("WU")).unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["WU", "WU1"]);
    }

    #[test]
    fn test_archetype_labels_unknown_colors() {
        let store = MemoryStore::new();
        assert!(archetype_labels(&store, "dsk", Some("XQ")).is_err());
    }

    #[test]
    fn test_format_overview_canonical_order() {
        let mut store = MemoryStore::new();
        // Stored in arbitrary order; output order must be canonical.
        store.archetypes = vec![
            archetype("BRG", 50, 90, 80),
            archetype("W", 200, 400, 380),
            archetype("WU", 100, 250, 150),
        ];

        let table = format_overview(&store, "dsk").unwrap();
        let labels: Vec<&str> = table.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, CANONICAL_ORDER.to_vec());
    }

    #[test]
    fn test_format_overview_per_archetype_metrics() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![archetype("WU", 100, 250, 150)];
        store.arch_game_stats = vec![
            game_row("WU", 6, true, 10),
            game_row("WU", 10, false, 10),
        ];

        let table = format_overview(&store, "dsk").unwrap();
        let wu = table.iter().find(|r| r.label == "WU").unwrap();
        assert_eq!(wu.num_drafts, 100);
        assert_eq!(wu.num_games, 400);
        assert_eq!(wu.win_rate, 0.625);
        assert_eq!(wu.average_win_length, 6.0);
        assert_eq!(wu.average_game_length, 8.0);
        // Losses take longer than wins: aggressive deck.
        assert_eq!(wu.aggression, 4.0);
    }

    #[test]
    fn test_format_overview_all_row_weighted_averages() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![
            archetype("WU", 0, 30, 10),
            archetype("BR", 0, 10, 30),
        ];
        store.arch_game_stats = vec![
            // WU: wins at turn 6, losses at turn 12.
            game_row("WU", 6, true, 30),
            game_row("WU", 12, false, 10),
            // BR: wins at turn 10, losses at turn 8.
            game_row("BR", 10, true, 10),
            game_row("BR", 8, false, 30),
        ];

        let table = format_overview(&store, "dsk").unwrap();
        let all = &table[0];
        assert_eq!(all.label, "ALL");
        assert_eq!(all.num_games, 80);
        assert_eq!(all.win_rate, 0.5);
        // Win length weighted by wins: (6*30 + 10*10) / 40 = 7.
        assert_eq!(all.average_win_length, 7.0);
        // Loss length weighted by losses: (12*10 + 8*30) / 40 = 9.
        // Aggression = 9 - 7 = 2.
        assert_eq!(all.aggression, 2.0);
    }

    #[test]
    fn test_format_overview_empty_store() {
        let store = MemoryStore::new();
        let table = format_overview(&store, "dsk").unwrap();
        assert_eq!(table.len(), 33);
        assert!(table.iter().all(|r| r.num_games == 0 && r.win_rate == 0.0));
    }

    #[test]
    fn test_format_overview_ignores_subdivided_archetypes() {
        let mut store = MemoryStore::new();
        store.archetypes = vec![
            archetype("WU", 100, 250, 150),
            archetype("WU1", 999, 999, 999),
        ];

        let table = format_overview(&store, "dsk").unwrap();
        let wu = table.iter().find(|r| r.label == "WU").unwrap();
        assert_eq!(wu.num_drafts, 100);
        // The subdivided row contributes nothing to the ALL sums either.
        let all = &table[0];
        assert_eq!(all.num_drafts, 100);
    }
}
