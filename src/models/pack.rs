//! Draft pack pick histograms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `(pack, pick)` slot's appearance counts: for each card name, how many
/// times it was seen in that slot. Used only to derive mean pick order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPackRow {
    pub pack_number: u32,
    pub pick_number: u32,
    pub counts: BTreeMap<String, u64>,
}
