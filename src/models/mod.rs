//! Core data models for the draft statistics engine.

mod archetype;
mod card;
mod counters;
mod decklist;
mod ids;
mod pack;
mod set_info;

pub use archetype::*;
pub use card::*;
pub use counters::*;
pub use decklist::*;
pub use ids::*;
pub use pack::*;
pub use set_info::*;
