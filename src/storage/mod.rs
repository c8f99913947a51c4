//! Filesystem store for per-set counter tables.
//!
//! Each set owns a directory of JSONL files under the data root, with the
//! set registry at the root. The derivation layer reads through the
//! [`StatsStore`] trait so tests can substitute an in-memory store.

mod jsonl;

pub use jsonl::{
    list_set_dirs, read_set_registry, write_set_registry, EntityType, JsonlReader, JsonlWriter,
};

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{
    ArchGameRow, ArchStartRow, Archetype, ArchetypeFilter, Card, CardDerivedRow, CardGameRow,
    Decklist, DraftPackRow, SetInfo,
};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Unknown set: {0}")]
    UnknownSet(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding one set's tables. Abbreviations are normalized to
    /// lowercase.
    pub fn set_dir(&self, set_abbr: &str) -> PathBuf {
        self.data_dir.join(set_abbr.to_lowercase())
    }

    /// The set registry file.
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("sets.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Read access to a set's raw counter tables and the set registry.
///
/// Archetype-filtered methods apply the filter at the store boundary: `All`
/// reads every row of raw counter tables, while on the precomputed
/// `CardDerivedStats` table it selects the rows stored with no archetype key
/// (the upstream all-archetypes aggregate).
pub trait StatsStore {
    fn cards(&self, set_abbr: &str) -> Result<Vec<Card>, StorageError>;

    fn archetypes(&self, set_abbr: &str) -> Result<Vec<Archetype>, StorageError>;

    fn arch_game_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchGameRow>, StorageError>;

    fn card_game_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardGameRow>, StorageError>;

    fn arch_start_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchStartRow>, StorageError>;

    fn card_derived_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardDerivedRow>, StorageError>;

    fn decklists(&self, set_abbr: &str) -> Result<Vec<Decklist>, StorageError>;

    fn draft_packs(&self, set_abbr: &str) -> Result<Vec<DraftPackRow>, StorageError>;

    fn sets(&self) -> Result<Vec<SetInfo>, StorageError>;
}

/// JSONL-backed store used by the binary.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StorageConfig,
}

impl FileStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn read_table<T: serde::de::DeserializeOwned>(
        &self,
        entity: EntityType,
        set_abbr: &str,
    ) -> Result<Vec<T>, StorageError> {
        JsonlReader::for_entity(&self.config, entity, set_abbr).read_all()
    }
}

impl StatsStore for FileStore {
    fn cards(&self, set_abbr: &str) -> Result<Vec<Card>, StorageError> {
        self.read_table(EntityType::Card, set_abbr)
    }

    fn archetypes(&self, set_abbr: &str) -> Result<Vec<Archetype>, StorageError> {
        self.read_table(EntityType::Archetype, set_abbr)
    }

    fn arch_game_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchGameRow>, StorageError> {
        let filter = *filter;
        JsonlReader::for_entity(&self.config, EntityType::ArchGameStats, set_abbr)
            .read_where(|row: &ArchGameRow| filter.matches(row.arch_id))
    }

    fn card_game_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardGameRow>, StorageError> {
        let filter = *filter;
        JsonlReader::for_entity(&self.config, EntityType::CardGameStats, set_abbr)
            .read_where(|row: &CardGameRow| filter.matches(row.arch_id))
    }

    fn arch_start_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchStartRow>, StorageError> {
        let filter = *filter;
        JsonlReader::for_entity(&self.config, EntityType::ArchStartStats, set_abbr)
            .read_where(|row: &ArchStartRow| filter.matches(row.arch_id))
    }

    fn card_derived_stats(
        &self,
        set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardDerivedRow>, StorageError> {
        let want = filter.arch_id();
        JsonlReader::for_entity(&self.config, EntityType::CardDerivedStats, set_abbr)
            .read_where(|row: &CardDerivedRow| row.arch_id == want)
    }

    fn decklists(&self, set_abbr: &str) -> Result<Vec<Decklist>, StorageError> {
        self.read_table(EntityType::Decklist, set_abbr)
    }

    fn draft_packs(&self, set_abbr: &str) -> Result<Vec<DraftPackRow>, StorageError> {
        self.read_table(EntityType::DraftPack, set_abbr)
    }

    fn sets(&self) -> Result<Vec<SetInfo>, StorageError> {
        read_set_registry(&self.config)
    }
}

/// In-memory store for derivation tests. Holds one set's tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub cards: Vec<Card>,
    pub archetypes: Vec<Archetype>,
    pub arch_game_stats: Vec<ArchGameRow>,
    pub card_game_stats: Vec<CardGameRow>,
    pub arch_start_stats: Vec<ArchStartRow>,
    pub card_derived_stats: Vec<CardDerivedRow>,
    pub decklists: Vec<Decklist>,
    pub draft_packs: Vec<DraftPackRow>,
    pub sets: Vec<SetInfo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for MemoryStore {
    fn cards(&self, _set_abbr: &str) -> Result<Vec<Card>, StorageError> {
        Ok(self.cards.clone())
    }

    fn archetypes(&self, _set_abbr: &str) -> Result<Vec<Archetype>, StorageError> {
        Ok(self.archetypes.clone())
    }

    fn arch_game_stats(
        &self,
        _set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchGameRow>, StorageError> {
        Ok(self
            .arch_game_stats
            .iter()
            .filter(|row| filter.matches(row.arch_id))
            .cloned()
            .collect())
    }

    fn card_game_stats(
        &self,
        _set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardGameRow>, StorageError> {
        Ok(self
            .card_game_stats
            .iter()
            .filter(|row| filter.matches(row.arch_id))
            .cloned()
            .collect())
    }

    fn arch_start_stats(
        &self,
        _set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<ArchStartRow>, StorageError> {
        Ok(self
            .arch_start_stats
            .iter()
            .filter(|row| filter.matches(row.arch_id))
            .cloned()
            .collect())
    }

    fn card_derived_stats(
        &self,
        _set_abbr: &str,
        filter: &ArchetypeFilter,
    ) -> Result<Vec<CardDerivedRow>, StorageError> {
        let want = filter.arch_id();
        Ok(self
            .card_derived_stats
            .iter()
            .filter(|row| row.arch_id == want)
            .cloned()
            .collect())
    }

    fn decklists(&self, _set_abbr: &str) -> Result<Vec<Decklist>, StorageError> {
        Ok(self.decklists.clone())
    }

    fn draft_packs(&self, _set_abbr: &str) -> Result<Vec<DraftPackRow>, StorageError> {
        Ok(self.draft_packs.clone())
    }

    fn sets(&self) -> Result<Vec<SetInfo>, StorageError> {
        Ok(self.sets.clone())
    }
}
