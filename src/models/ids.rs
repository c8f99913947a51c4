//! Color and archetype identity.
//!
//! Archetypes carry two identification schemes for the same entity: a 5-bit
//! WUBRG color bitmask and a numeric id in `[0, 160)` where `id % 32` is the
//! bitmask and `id / 32` is the subdivision index. All decomposition lives
//! behind `ArchId` so call sites never do the bitmask arithmetic themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity resolution errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchetypeError {
    #[error("Unknown color letter: {0}")]
    UnknownColor(char),

    #[error("Unknown archetype label: {0}")]
    UnknownLabel(String),

    #[error("Archetype id out of range: {0}")]
    IdOutOfRange(u16),
}

/// Color letters in canonical order, with their bit values.
const COLOR_LETTERS: [(char, u8); 5] = [('W', 1), ('U', 2), ('B', 4), ('R', 8), ('G', 16)];

/// A 5-bit color combination over {W, U, B, R, G}. Zero is colorless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMask(u8);

impl ColorMask {
    pub const COLORLESS: ColorMask = ColorMask(0);

    /// Build a mask from a bit pattern. Bits above G are rejected.
    pub fn from_bits(bits: u8) -> Result<Self, ArchetypeError> {
        if bits >= 32 {
            return Err(ArchetypeError::IdOutOfRange(bits as u16));
        }
        Ok(Self(bits))
    }

    /// Parse a WUBRG letter string (e.g. "WU", "brg"). The empty string and
    /// "C" both denote colorless.
    pub fn from_letters(letters: &str) -> Result<Self, ArchetypeError> {
        if letters.eq_ignore_ascii_case("C") {
            return Ok(Self::COLORLESS);
        }
        let mut bits = 0u8;
        for ch in letters.chars() {
            let upper = ch.to_ascii_uppercase();
            let bit = COLOR_LETTERS
                .iter()
                .find(|(letter, _)| *letter == upper)
                .map(|(_, bit)| *bit)
                .ok_or(ArchetypeError::UnknownColor(ch))?;
            bits |= bit;
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_colorless(&self) -> bool {
        self.0 == 0
    }

    /// True if every color in `other` is present in `self`.
    pub fn contains(&self, other: ColorMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Letters in WUBRG order, or "C" for colorless.
    pub fn letters(&self) -> String {
        if self.0 == 0 {
            return "C".to_string();
        }
        COLOR_LETTERS
            .iter()
            .filter(|(_, bit)| self.0 & bit != 0)
            .map(|(letter, _)| letter)
            .collect()
    }
}

impl fmt::Display for ColorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letters())
    }
}

/// A numeric archetype id: color bitmask plus subdivision.
///
/// Ids below 32 are unsplit base color combinations; ids `32d + mask` with
/// `d` in 1..=4 are subdivisions of the same colors, labeled with a trailing
/// digit (e.g. "WU2").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchId(u8);

/// Number of base color combinations (one per bitmask value).
pub const NUM_BASE_ARCHETYPES: u8 = 32;

/// Exclusive upper bound on archetype ids (32 masks x 5 subdivisions).
pub const MAX_ARCH_ID: u16 = 160;

impl ArchId {
    /// Build from a raw id, rejecting out-of-range values.
    pub fn new(raw: u16) -> Result<Self, ArchetypeError> {
        if raw >= MAX_ARCH_ID {
            return Err(ArchetypeError::IdOutOfRange(raw));
        }
        Ok(Self(raw as u8))
    }

    /// Build from a color mask and subdivision index (0 = unsplit).
    pub fn from_parts(colors: ColorMask, subdivision: u8) -> Result<Self, ArchetypeError> {
        if subdivision > 4 {
            return Err(ArchetypeError::IdOutOfRange(
                subdivision as u16 * NUM_BASE_ARCHETYPES as u16 + colors.bits() as u16,
            ));
        }
        Ok(Self(subdivision * NUM_BASE_ARCHETYPES + colors.bits()))
    }

    /// Resolve a label like "WU", "BRG2", or "C". "ALL" is not an archetype
    /// and is rejected here; the synthetic aggregate is handled by
    /// [`ArchetypeFilter`] before id resolution.
    pub fn from_label(label: &str) -> Result<Self, ArchetypeError> {
        let label = label.trim().to_ascii_uppercase();
        if label.is_empty() || label == "ALL" {
            return Err(ArchetypeError::UnknownLabel(label));
        }
        let (letters, subdivision) = match label.chars().last() {
            Some(digit @ '1'..='4') => (
                &label[..label.len() - 1],
                digit.to_digit(10).unwrap_or(0) as u8,
            ),
            _ => (label.as_str(), 0),
        };
        let colors = ColorMask::from_letters(letters)
            .map_err(|_| ArchetypeError::UnknownLabel(label.clone()))?;
        Self::from_parts(colors, subdivision)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }

    /// The color combination shared by all subdivisions of this id.
    pub fn color_mask(&self) -> ColorMask {
        ColorMask(self.0 % NUM_BASE_ARCHETYPES)
    }

    /// Subdivision index; 0 for the unsplit base archetype.
    pub fn subdivision(&self) -> u8 {
        self.0 / NUM_BASE_ARCHETYPES
    }

    /// True for unsplit base color combinations (`id < 32`).
    pub fn is_base(&self) -> bool {
        self.0 < NUM_BASE_ARCHETYPES
    }

    /// Canonical label: color letters, with a trailing subdivision digit for
    /// split archetypes.
    pub fn label(&self) -> String {
        let letters = self.color_mask().letters();
        match self.subdivision() {
            0 => letters,
            d => format!("{}{}", letters, d),
        }
    }
}

impl fmt::Display for ArchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Archetype selection for counter-table queries.
///
/// `All` is the synthetic "ALL" aggregate: no archetype predicate on raw
/// counter tables, the stored aggregate rows on precomputed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchetypeFilter {
    All,
    Archetype(ArchId),
}

impl ArchetypeFilter {
    /// Resolve a user-supplied label, special-casing "ALL" before the codec.
    pub fn from_label(label: &str) -> Result<Self, ArchetypeError> {
        if label.trim().eq_ignore_ascii_case("ALL") {
            return Ok(Self::All);
        }
        Ok(Self::Archetype(ArchId::from_label(label)?))
    }

    pub fn matches(&self, id: ArchId) -> bool {
        match self {
            Self::All => true,
            Self::Archetype(want) => *want == id,
        }
    }

    pub fn arch_id(&self) -> Option<ArchId> {
        match self {
            Self::All => None,
            Self::Archetype(id) => Some(*id),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            Self::Archetype(id) => id.label(),
        }
    }
}

/// The fixed 33-row output order for format-level tables: the ALL aggregate,
/// colorless, then color combinations grouped by color count.
pub const CANONICAL_ORDER: [&str; 33] = [
    "ALL", "C", "W", "U", "B", "R", "G", "WU", "WB", "WR", "WG", "UB", "UR", "UG", "BR", "BG",
    "RG", "WUB", "WUR", "WUG", "WBR", "WBG", "WRG", "UBR", "UBG", "URG", "BRG", "WUBR", "WUBG",
    "WURG", "WBRG", "UBRG", "WUBRG",
];
