//! Per-set card identity data.

use serde::{Deserialize, Serialize};

use super::ColorMask;

/// One card in a set's card pool. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Numeric id, unique within the set.
    pub id: u32,

    /// Card name, unique within the set.
    pub name: String,

    /// Color identity by mana cost. Lands are stored colorless.
    pub color: ColorMask,

    /// Type tokens; "L" marks a land.
    pub card_type: String,

    pub rarity: String,
}

impl Card {
    pub fn new(id: u32, name: String, color: ColorMask, card_type: String, rarity: String) -> Self {
        Self {
            id,
            name,
            color,
            card_type,
            rarity,
        }
    }

    pub fn is_land(&self) -> bool {
        self.card_type.contains('L')
    }
}
