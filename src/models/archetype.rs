//! Archetype running totals.

use serde::{Deserialize, Serialize};

use super::ArchId;

/// One archetype's stored totals for a set.
///
/// The label is stored alongside the id because the two are maintained by the
/// same upstream writer; readers should treat the id as authoritative and
/// derive labels through the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: ArchId,
    pub label: String,
    pub num_drafts: u64,
    pub num_wins: u64,
    pub num_losses: u64,
}

impl Archetype {
    pub fn new(id: ArchId, num_drafts: u64, num_wins: u64, num_losses: u64) -> Self {
        Self {
            label: id.label(),
            id,
            num_drafts,
            num_wins,
            num_losses,
        }
    }

    pub fn num_games(&self) -> u64 {
        self.num_wins + self.num_losses
    }
}
