//! Raw per-game counter rows.
//!
//! All four shapes are append-style: many rows per key, written once when a
//! game is recorded and never updated. The derivation layer only ever sums
//! them.

use serde::{Deserialize, Serialize};

use super::ArchId;

/// Number of mana-value buckets in a deck curve (mana values 0 through 8).
pub const CURVE_BUCKETS: usize = 9;

/// Card counts per mana-value bucket for one deck. Lands are counted
/// separately and weigh zero in mana-value averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManaCurve {
    pub lands: u64,
    pub drops: [u64; CURVE_BUCKETS],
}

impl ManaCurve {
    /// Accumulate another curve into this one.
    pub fn add(&mut self, other: &ManaCurve) {
        self.lands += other.lands;
        for (slot, count) in self.drops.iter_mut().zip(other.drops.iter()) {
            *slot += count;
        }
    }
}

/// Per-archetype game outcome counter, keyed by `(arch_id, turns, won)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchGameRow {
    pub arch_id: ArchId,
    pub turns: u32,
    pub won: bool,
    pub game_count: u64,
    pub curve: ManaCurve,
}

/// Per-card game outcome counter, keyed by `(card_id, arch_id, copies)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGameRow {
    pub card_id: u32,
    pub arch_id: ArchId,
    pub copies: u32,
    pub win_count: u64,
    pub game_count: u64,
}

/// Opening-hand counter, keyed by `(arch_id, num_mulligans, on_play)`.
///
/// Upstream storage pre-aggregates any game with 3 or more mulligans into
/// `num_mulligans == 3` and writes all eight `(mulligans, on_play)` rows per
/// archetype, zero-filled where no games were observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchStartRow {
    pub arch_id: ArchId,
    pub num_mulligans: u32,
    pub on_play: bool,
    pub win_count: u64,
    pub game_count: u64,
}

/// Precomputed per-card derived signals, keyed by `(card_id, arch_id)`.
///
/// `arch_id == None` is the upstream all-archetypes aggregate row. These
/// fields are surfaced, not derived, by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDerivedRow {
    pub card_id: u32,
    pub arch_id: Option<ArchId>,
    pub games_in_hand: u64,
    pub wins_in_hand: u64,
    pub avg_win_shares: f64,
    pub adjusted_iwd: f64,
    pub inclusion_impact: f64,
}
