//! JSONL (JSON Lines) storage.
//!
//! Each line is a valid JSON object representing one entity. Stores read
//! the whole file and rewrite it on mutation; files are small (one row per
//! place, a few rows per market per week). Lines that do not parse are
//! skipped on read but written back verbatim on rewrite.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{in_replace_scope, EventStore, PlaceStore, StorageConfig, StorageError};
use crate::materialize::Window;
use crate::models::{Occurrence, Place, PlaceId};

/// One line of a JSONL file.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonlRow<T> {
    Parsed(T),
    /// Raw text of a line that did not deserialize
    Unparsed(String),
}

impl<T> JsonlRow<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            JsonlRow::Parsed(entity) => Some(entity),
            JsonlRow::Unparsed(_) => None,
        }
    }

    pub fn parsed_mut(&mut self) -> Option<&mut T> {
        match self {
            JsonlRow::Parsed(entity) => Some(entity),
            JsonlRow::Unparsed(_) => None,
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

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append multiple entities to the file.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
        }

        writer.flush()?;
        info!("Appended {} entities to {:?}", entities.len(), self.path);

        Ok(entities.len())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        let lines = entities
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.replace_lines(&lines)?;
        Ok(entities.len())
    }

    /// Write rows, replacing the entire file. Unparsed rows keep their
    /// original text.
    pub fn write_rows(&self, rows: &[JsonlRow<T>]) -> Result<usize, StorageError> {
        let lines = rows
            .iter()
            .map(|row| match row {
                JsonlRow::Parsed(entity) => serde_json::to_string(entity),
                JsonlRow::Unparsed(raw) => Ok(raw.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.replace_lines(&lines)?;
        Ok(rows.len())
    }

    /// Lines go to a sibling temp file that is renamed over the target, so a
    /// crash mid-write leaves the previous contents intact.
    fn replace_lines(&self, lines: &[String]) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let tmp = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);

        for line in lines {
            writeln!(writer, "{}", line)?;
        }

        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} rows to {:?}", lines.len(), self.path);

        Ok(())
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

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every non-blank line, keeping the ones that do not parse as raw text.
    pub fn read_rows(&self) -> Result<Vec<JsonlRow<T>>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => rows.push(JsonlRow::Parsed(entity)),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                    rows.push(JsonlRow::Unparsed(line));
                }
            }
        }

        Ok(rows)
    }

    /// Read all entities from the file, skipping lines that do not parse.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        let entities: Vec<T> = self
            .read_rows()?
            .into_iter()
            .filter_map(|row| match row {
                JsonlRow::Parsed(entity) => Some(entity),
                JsonlRow::Unparsed(_) => None,
            })
            .collect();

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }
}

/// Places in `places.jsonl`.
pub struct JsonlPlaceStore {
    path: PathBuf,
}

impl JsonlPlaceStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self::at(config.places_path())
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn reader(&self) -> JsonlReader<Place> {
        JsonlReader::new(self.path.clone())
    }

    fn writer(&self) -> JsonlWriter<Place> {
        JsonlWriter::new(self.path.clone())
    }
}

impl PlaceStore for JsonlPlaceStore {
    fn get(&self, id: &PlaceId) -> Result<Option<Place>, StorageError> {
        Ok(self.reader().read_where(|p| &p.id == id)?.into_iter().next())
    }

    fn list(&self) -> Result<Vec<Place>, StorageError> {
        self.reader().read_all()
    }

    fn upsert(&mut self, place: Place) -> Result<(), StorageError> {
        let mut rows = self.reader().read_rows()?;
        match rows
            .iter_mut()
            .filter_map(JsonlRow::parsed_mut)
            .find(|p| p.id == place.id)
        {
            Some(existing) => *existing = place,
            None => rows.push(JsonlRow::Parsed(place)),
        }
        self.writer().write_rows(&rows)?;
        Ok(())
    }

    fn set_market_flag(&mut self, id: &PlaceId, is_market: bool) -> Result<(), StorageError> {
        let mut rows = self.reader().read_rows()?;
        let place = rows
            .iter_mut()
            .filter_map(JsonlRow::parsed_mut)
            .find(|p| &p.id == id)
            .ok_or_else(|| StorageError::PlaceNotFound(id.clone()))?;
        place.is_market = is_market;
        place.updated_at = Utc::now();
        self.writer().write_rows(&rows)?;
        Ok(())
    }
}

/// Occurrences in `market_events.jsonl`.
pub struct JsonlEventStore {
    path: PathBuf,
}

impl JsonlEventStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self::at(config.events_path())
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn reader(&self) -> JsonlReader<Occurrence> {
        JsonlReader::new(self.path.clone())
    }

    fn writer(&self) -> JsonlWriter<Occurrence> {
        JsonlWriter::new(self.path.clone())
    }
}

impl EventStore for JsonlEventStore {
    fn insert(&mut self, occurrences: &[Occurrence]) -> Result<usize, StorageError> {
        self.writer().append_batch(occurrences)
    }

    fn delete_window(
        &mut self,
        place_id: &PlaceId,
        source: &str,
        window: &Window,
    ) -> Result<usize, StorageError> {
        let rows = self.reader().read_rows()?;
        let before = rows.len();
        let kept = retain_outside_scope(rows, place_id, source, window);
        let deleted = before - kept.len();
        if deleted > 0 {
            self.writer().write_rows(&kept)?;
        }
        Ok(deleted)
    }

    fn query(
        &self,
        place_id: &PlaceId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Occurrence>, StorageError> {
        let mut found = self
            .reader()
            .read_where(|o| &o.place_id == place_id && from <= o.start_at && o.start_at <= to)?;
        found.sort_by_key(|o| o.start_at);
        Ok(found)
    }

    /// Delete and insert in a single file rewrite.
    fn replace_window(
        &mut self,
        place_id: &PlaceId,
        source: &str,
        window: &Window,
        occurrences: &[Occurrence],
    ) -> Result<(usize, usize), StorageError> {
        let rows = self.reader().read_rows()?;
        let before = rows.len();
        let mut kept = retain_outside_scope(rows, place_id, source, window);
        let deleted = before - kept.len();

        kept.extend(occurrences.iter().cloned().map(JsonlRow::Parsed));
        self.writer().write_rows(&kept)?;
        Ok((deleted, occurrences.len()))
    }
}

/// Rows a window-scoped delete keeps; unparsed rows are always kept.
fn retain_outside_scope(
    rows: Vec<JsonlRow<Occurrence>>,
    place_id: &PlaceId,
    source: &str,
    window: &Window,
) -> Vec<JsonlRow<Occurrence>> {
    rows.into_iter()
        .filter(|row| {
            !row
                .parsed()
                .is_some_and(|o| in_replace_scope(o, place_id, source, window))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, OPENING_HOURS_SOURCE};
    use chrono::{NaiveDate, Weekday};
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestEntity {
        id: String,
        value: u32,
    }

    fn entity(id: &str, value: u32) -> TestEntity {
        TestEntity {
            id: id.to_string(),
            value,
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn occurrence(place: &str, start: NaiveDateTime) -> Occurrence {
        Occurrence::new(
            EntityId::from(place),
            OPENING_HOURS_SOURCE,
            Weekday::Sat,
            start,
            None,
            at(18, 9),
        )
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.jsonl");

        let entities = vec![entity("1", 100), entity("2", 200)];

        let writer: JsonlWriter<TestEntity> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&entities).unwrap(), 2);

        let reader: JsonlReader<TestEntity> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), entities);
    }

    #[test]
    fn test_jsonl_read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<TestEntity> =
            JsonlReader::new(temp_dir.path().join("nonexistent.jsonl"));

        assert!(!reader.exists());
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_batch_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("rows.jsonl");
        let writer: JsonlWriter<TestEntity> = JsonlWriter::new(path.clone());

        writer.append_batch(&[entity("1", 1)]).unwrap();
        writer.append_batch(&[entity("2", 2)]).unwrap();
        assert_eq!(writer.append_batch(&[]).unwrap(), 0);

        let reader: JsonlReader<TestEntity> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.jsonl");
        fs::write(&path, "{\"id\":\"1\",\"value\":1}\nnot json\n\n{\"id\":\"2\",\"value\":2}\n").unwrap();

        let reader: JsonlReader<TestEntity> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_write_all_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        let writer: JsonlWriter<TestEntity> = JsonlWriter::new(path.clone());

        writer.write_all(&[entity("1", 1)]).unwrap();
        writer.write_all(&[entity("2", 2)]).unwrap();

        assert!(!path.with_extension("jsonl.tmp").exists());
        let reader: JsonlReader<TestEntity> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), vec![entity("2", 2)]);
    }

    #[test]
    fn test_write_rows_keeps_unparsed_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        let writer: JsonlWriter<TestEntity> = JsonlWriter::new(path.clone());

        writer
            .write_rows(&[
                JsonlRow::Parsed(entity("1", 1)),
                JsonlRow::Unparsed("{\"id\": 7, \"legacy\": true}".to_string()),
            ])
            .unwrap();

        let reader: JsonlReader<TestEntity> = JsonlReader::new(path.clone());
        assert_eq!(
            reader.read_rows().unwrap(),
            vec![
                JsonlRow::Parsed(entity("1", 1)),
                JsonlRow::Unparsed("{\"id\": 7, \"legacy\": true}".to_string()),
            ]
        );
        assert_eq!(reader.read_all().unwrap(), vec![entity("1", 1)]);
    }

    #[test]
    fn test_place_store_rewrite_keeps_corrupt_line() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        fs::write(config.places_path(), "{\"id\": \"truncated\n").unwrap();
        let mut store = JsonlPlaceStore::new(&config);

        let place = Place::new("Village Market".to_string(), "osm".to_string(), "3".to_string());
        let id = place.id.clone();
        store.upsert(place).unwrap();
        store.set_market_flag(&id, true).unwrap();

        let contents = fs::read_to_string(config.places_path()).unwrap();
        assert!(contents.lines().any(|line| line == "{\"id\": \"truncated"));
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.get(&id).unwrap().unwrap().is_market);
    }

    #[test]
    fn test_event_store_rewrite_keeps_corrupt_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        let mut store = JsonlEventStore::at(&path);
        let window = Window::forward(at(18, 9), 7);
        let place = EntityId::from("p1");

        store.insert(&[occurrence("p1", at(24, 8))]).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        drop(file);

        store
            .replace_window(&place, OPENING_HOURS_SOURCE, &window, &[occurrence("p1", at(24, 9))])
            .unwrap();
        let deleted = store
            .delete_window(&place, OPENING_HOURS_SOURCE, &window)
            .unwrap();

        assert_eq!(deleted, 1);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().collect::<Vec<_>>(), vec!["not json"]);
    }

    #[test]
    fn test_place_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonlPlaceStore::new(&StorageConfig::new(temp_dir.path().to_path_buf()));

        let place = Place::new("Harbour Night Market".to_string(), "osm".to_string(), "7".to_string())
            .with_opening_hours(vec!["Friday: 5pm-10pm".to_string()])
            .with_market_flag(true);
        let id = place.id.clone();

        store.upsert(place.clone()).unwrap();
        store.upsert(place).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        store.set_market_flag(&id, false).unwrap();
        assert!(!store.get(&id).unwrap().unwrap().is_market);
        assert!(store.market_places_with_hours(10).unwrap().is_empty());
    }

    #[test]
    fn test_event_store_replace_window() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonlEventStore::at(temp_dir.path().join("events.jsonl"));
        let window = Window::forward(at(18, 9), 7);
        let place = EntityId::from("p1");

        store
            .insert(&[occurrence("p1", at(24, 8)), occurrence("p2", at(24, 8))])
            .unwrap();

        let (deleted, inserted) = store
            .replace_window(
                &place,
                OPENING_HOURS_SOURCE,
                &window,
                &[occurrence("p1", at(24, 9)), occurrence("p1", at(25, 9))],
            )
            .unwrap();
        assert_eq!((deleted, inserted), (1, 2));

        let found = store.query(&place, window.start, window.end).unwrap();
        let starts: Vec<_> = found.iter().map(|o| o.start_at).collect();
        assert_eq!(starts, vec![at(24, 9), at(25, 9)]);
        assert_eq!(
            store
                .query(&EntityId::from("p2"), window.start, window.end)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_event_store_delete_window_untouched_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonlEventStore::at(temp_dir.path().join("events.jsonl"));
        let window = Window::forward(at(18, 9), 7);

        let deleted = store
            .delete_window(&EntityId::from("p1"), OPENING_HOURS_SOURCE, &window)
            .unwrap();
        assert_eq!(deleted, 0);
    }
}
