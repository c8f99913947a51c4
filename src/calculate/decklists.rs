//! Decklist aggregates: mean decklists and meta distribution.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{safe_ratio, StatsError};
use crate::models::{ArchId, ColorMask, Decklist, MAX_RANK, MAX_WINS};
use crate::storage::StatsStore;

/// Deck selection for mean-decklist queries.
///
/// A label with a trailing subdivision digit selects exactly that archetype;
/// a plain color label selects every deck with those main colors regardless
/// of subdivision; "ALL" selects every deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckGroup {
    All,
    Colors(ColorMask),
    Archetype(ArchId),
}

impl DeckGroup {
    pub fn from_label(label: &str) -> Result<Self, StatsError> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("ALL") {
            return Ok(Self::All);
        }
        if label.chars().last().is_some_and(|c| c.is_ascii_digit()) {
            return Ok(Self::Archetype(ArchId::from_label(label)?));
        }
        Ok(Self::Colors(ColorMask::from_letters(label)?))
    }

    fn matches(&self, deck: &Decklist) -> bool {
        match self {
            Self::All => true,
            Self::Colors(mask) => deck.arch_id.color_mask() == *mask,
            Self::Archetype(id) => deck.arch_id == *id,
        }
    }
}

/// Filter ranges for mean-decklist queries. Defaults select everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckFilters {
    pub min_wins: u32,
    pub max_wins: u32,
    pub min_rank: u8,
    pub max_rank: u8,
}

impl Default for DeckFilters {
    fn default() -> Self {
        Self {
            min_wins: 0,
            max_wins: MAX_WINS,
            min_rank: 0,
            max_rank: MAX_RANK,
        }
    }
}

impl DeckFilters {
    fn matches(&self, deck: &Decklist) -> bool {
        deck.wins >= self.min_wins
            && deck.wins <= self.max_wins
            && deck.rank >= self.min_rank
            && deck.rank <= self.max_rank
    }
}

/// The mean inclusion count per card over a group of decks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanDecklist {
    pub num_decks: u64,
    /// Mean copies per card name, zero-filled over the set's card pool.
    pub cards: BTreeMap<String, f64>,
}

/// Average decklist for the selected group, with inclusive win and rank-tier
/// filters. Zero matching decks yields a zero-filled result over the card
/// pool, not an error.
pub fn mean_decklist(
    store: &dyn StatsStore,
    set_abbr: &str,
    group: DeckGroup,
    filters: DeckFilters,
) -> Result<MeanDecklist, StatsError> {
    let card_pool = store.cards(set_abbr)?;
    let decks: Vec<Decklist> = store
        .decklists(set_abbr)?
        .into_iter()
        .filter(|deck| group.matches(deck) && filters.matches(deck))
        .collect();

    let num_decks = decks.len() as u64;
    let mut cards = BTreeMap::new();
    for card in &card_pool {
        let total: u64 = decks
            .iter()
            .map(|deck| deck.copies_of(&card.name) as u64)
            .sum();
        cards.insert(card.name.clone(), safe_ratio(total, num_decks));
    }

    Ok(MeanDecklist { num_decks, cards })
}

/// One color group's share of the metagame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaShare {
    pub main_colors: String,
    pub drafts: u64,
    pub meta_share: f64,
}

/// Number of drafts per main-color group, with each group's share of the
/// total. An inclusive rank-tier filter restricts to the metagame at the
/// caller's level.
pub fn meta_distribution(
    store: &dyn StatsStore,
    set_abbr: &str,
    min_rank: u8,
    max_rank: u8,
) -> Result<Vec<MetaShare>, StatsError> {
    let decks = store.decklists(set_abbr)?;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for deck in &decks {
        if deck.rank < min_rank || deck.rank > max_rank {
            continue;
        }
        *counts.entry(deck.main_colors.clone()).or_default() += 1;
    }

    let total: u64 = counts.values().sum();
    Ok(counts
        .into_iter()
        .map(|(main_colors, drafts)| MetaShare {
            main_colors,
            drafts,
            meta_share: safe_ratio(drafts, total),
        })
        .collect())
}
