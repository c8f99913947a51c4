//! JSONL (JSON Lines) storage.
//!
//! JSONL files are the source of truth for all per-set tables. Each line is
//! one JSON object representing one row.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};

/// Per-set table identifiers for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Card,
    Archetype,
    ArchGameStats,
    CardGameStats,
    ArchStartStats,
    CardDerivedStats,
    Decklist,
    DraftPack,
}

impl EntityType {
    /// Get the filename for this table.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Card => "cards.jsonl",
            EntityType::Archetype => "archetypes.jsonl",
            EntityType::ArchGameStats => "arch_game_stats.jsonl",
            EntityType::CardGameStats => "card_game_stats.jsonl",
            EntityType::ArchStartStats => "arch_start_stats.jsonl",
            EntityType::CardDerivedStats => "card_derived_stats.jsonl",
            EntityType::Decklist => "decklists.jsonl",
            EntityType::DraftPack => "draft_packs.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a table in a set's directory.
    pub fn for_entity(config: &StorageConfig, entity: EntityType, set_abbr: &str) -> Self {
        Self::new(config.set_dir(set_abbr).join(entity.filename()))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single row to the file.
    pub fn append(&self, row: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(row)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended row to {:?}", self.path);
        Ok(())
    }

    /// Append multiple rows to the file.
    pub fn append_batch(&self, rows: &[T]) -> Result<usize, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for row in rows {
            let json = serde_json::to_string(row)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Appended {} rows to {:?}", count, self.path);

        Ok(count)
    }

    /// Write rows, replacing the entire file.
    pub fn write_all(&self, rows: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for row in rows {
            let json = serde_json::to_string(row)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Wrote {} rows to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a table in a set's directory.
    pub fn for_entity(config: &StorageConfig, entity: EntityType, set_abbr: &str) -> Self {
        Self::new(config.set_dir(set_abbr).join(entity.filename()))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all rows from the file. Malformed lines are skipped with a
    /// warning; a missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num, self.path, e
                    );
                }
            }
        }

        debug!("Read {} rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }

    /// Read rows matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }

    /// Count rows in the file.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let count = reader.lines().filter(|l| l.is_ok()).count();

        Ok(count)
    }
}

/// Find all set directories under the data root.
pub fn list_set_dirs(config: &StorageConfig) -> Result<Vec<String>, StorageError> {
    let dir = &config.data_dir;
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                sets.push(name.to_string());
            }
        }
    }

    sets.sort();
    Ok(sets)
}

/// Read the set registry.
pub fn read_set_registry(
    config: &StorageConfig,
) -> Result<Vec<crate::models::SetInfo>, StorageError> {
    let reader = JsonlReader::new(config.registry_path());
    reader.read_all()
}

/// Write the set registry, sorted by release date.
pub fn write_set_registry(
    config: &StorageConfig,
    sets: &mut [crate::models::SetInfo],
) -> Result<usize, StorageError> {
    sets.sort_by_key(|s| s.release_date);
    let writer = JsonlWriter::new(config.registry_path());
    writer.write_all(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRow {
        id: u32,
        name: String,
        value: u32,
    }

    fn row(id: u32, name: &str, value: u32) -> TestRow {
        TestRow {
            id,
            name: name.to_string(),
            value,
        }
    }

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.jsonl");

        let rows = vec![row(1, "First", 100), row(2, "Second", 200)];

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        let count = writer.write_all(&rows).unwrap();
        assert_eq!(count, 2);

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        let read = reader.read_all().unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read[0], rows[0]);
        assert_eq!(read[1], rows[1]);
    }

    #[test]
    fn test_jsonl_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("append.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<TestRow> = JsonlReader::new(path);

        writer.append(&row(1, "First", 100)).unwrap();
        writer.append(&row(2, "Second", 200)).unwrap();

        let rows = reader.read_all().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_jsonl_read_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        let rows = reader.read_all().unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn test_jsonl_count() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("count.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        writer
            .write_all(&[row(1, "A", 1), row(2, "B", 2), row(3, "C", 3)])
            .unwrap();

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        assert_eq!(reader.count().unwrap(), 3);
    }

    #[test]
    fn test_jsonl_read_where() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filter.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        writer
            .write_all(&[row(1, "A", 50), row(2, "B", 150), row(3, "C", 250)])
            .unwrap();

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        let filtered = reader.read_where(|r| r.value > 100).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].name, "B");
        assert_eq!(filtered[1].name, "C");
    }

    #[test]
    fn test_entity_type_filenames() {
        assert_eq!(EntityType::Card.filename(), "cards.jsonl");
        assert_eq!(EntityType::Archetype.filename(), "archetypes.jsonl");
        assert_eq!(EntityType::ArchGameStats.filename(), "arch_game_stats.jsonl");
        assert_eq!(EntityType::Decklist.filename(), "decklists.jsonl");
        assert_eq!(EntityType::DraftPack.filename(), "draft_packs.jsonl");
    }

    #[test]
    fn test_for_entity_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let writer: JsonlWriter<TestRow> =
            JsonlWriter::for_entity(&config, EntityType::Card, "dsk");

        let expected = config.set_dir("dsk").join("cards.jsonl");
        assert_eq!(writer.path, expected);
    }

    #[test]
    fn test_append_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("batch.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<TestRow> = JsonlReader::new(path);

        let rows = vec![row(1, "A", 10), row(2, "B", 20), row(3, "C", 30)];

        let count = writer.append_batch(&rows).unwrap();
        assert_eq!(count, 3);

        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0].name, "A");
        assert_eq!(read[2].name, "C");
    }

    #[test]
    fn test_append_batch_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty_batch.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path);
        let count = writer.append_batch(&[]).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_write_all_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overwrite.jsonl");

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<TestRow> = JsonlReader::new(path);

        writer.write_all(&[row(1, "Old", 1)]).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 1);

        writer
            .write_all(&[row(2, "New1", 2), row(3, "New2", 3)])
            .unwrap();

        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].name, "New1");
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");

        std::fs::write(
            &path,
            r#"{"id":1,"name":"Good","value":1}
not-valid-json
{"id":2,"name":"Also Good","value":2}
"#,
        )
        .unwrap();

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        let rows = reader.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Good");
        assert_eq!(rows[1].name, "Also Good");
    }

    #[test]
    fn test_list_set_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        fs::create_dir_all(config.set_dir("dsk")).unwrap();
        fs::create_dir_all(config.set_dir("blb")).unwrap();
        fs::create_dir_all(config.set_dir("otj")).unwrap();

        let sets = list_set_dirs(&config).unwrap();
        assert_eq!(sets, vec!["blb", "dsk", "otj"]);
    }

    #[test]
    fn test_list_set_dirs_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().join("missing"));
        assert!(list_set_dirs(&config).unwrap().is_empty());
    }

    #[test]
    fn test_set_registry_round_trip_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut sets = vec![
            crate::models::SetInfo::new(
                "dsk",
                "Duskmourn",
                chrono::NaiveDate::from_ymd_opt(2024, 9, 27).unwrap(),
            ),
            crate::models::SetInfo::new(
                "blb",
                "Bloomburrow",
                chrono::NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
            ),
        ];

        write_set_registry(&config, &mut sets).unwrap();

        let read = read_set_registry(&config).unwrap();
        assert_eq!(read.len(), 2);
        // Sorted by release date.
        assert_eq!(read[0].set_abbr, "blb");
        assert_eq!(read[1].set_abbr, "dsk");
    }

    #[test]
    fn test_read_set_registry_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        assert!(read_set_registry(&config).unwrap().is_empty());
    }

    #[test]
    fn test_count_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");
        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        assert_eq!(reader.count().unwrap(), 0);
    }
}
