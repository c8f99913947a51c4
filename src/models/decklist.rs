//! Drafted deck rows and rank tiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ArchId;

/// Rank tier names, indexed by numeric tier (0 = unranked).
pub const RANK_NAMES: [&str; 7] = [
    "unranked",
    "bronze",
    "silver",
    "gold",
    "platinum",
    "diamond",
    "mythic",
];

/// Highest rank tier (mythic).
pub const MAX_RANK: u8 = 6;

/// Maximum wins in a draft run.
pub const MAX_WINS: u32 = 7;

pub fn rank_name(tier: u8) -> Option<&'static str> {
    RANK_NAMES.get(tier as usize).copied()
}

/// One drafted deck. Card inclusion is a sparse map from card name to copy
/// count; a card absent from the map was not in the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decklist {
    /// Main color letters in WUBRG order, as written by the upstream
    /// classifier (matches `arch_id`'s color mask).
    pub main_colors: String,
    pub arch_id: ArchId,
    /// Numeric rank tier 0..=6.
    pub rank: u8,
    pub wins: u32,
    pub cards: BTreeMap<String, u32>,
}

impl Decklist {
    pub fn copies_of(&self, card_name: &str) -> u32 {
        self.cards.get(card_name).copied().unwrap_or(0)
    }
}
