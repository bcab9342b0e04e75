//! Place and occurrence stores.
//!
//! Two collaborators back the engine:
//! - a place store (read/write, keyed by place id)
//! - an event store (occurrences, queryable by place and time range)
//!
//! [`memory`] keeps both in maps for tests; [`jsonl`] keeps them as JSON
//! Lines files under the data directory.

pub mod jsonl;
pub mod memory;

pub use jsonl::{JsonlEventStore, JsonlPlaceStore, JsonlReader, JsonlRow, JsonlWriter};
pub use memory::{MemoryEventStore, MemoryPlaceStore};

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

use crate::materialize::Window;
use crate::models::{Occurrence, Place, PlaceId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Place not found: {0}")]
    PlaceNotFound(PlaceId),
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

    pub fn places_path(&self) -> PathBuf {
        self.data_dir.join("places.jsonl")
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("market_events.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Place records, keyed by id.
pub trait PlaceStore {
    fn get(&self, id: &PlaceId) -> Result<Option<Place>, StorageError>;

    fn list(&self) -> Result<Vec<Place>, StorageError>;

    /// Insert, or replace the record with the same id.
    fn upsert(&mut self, place: Place) -> Result<(), StorageError>;

    /// Write the classifier's market flag.
    fn set_market_flag(&mut self, id: &PlaceId, is_market: bool) -> Result<(), StorageError>;

    /// Places flagged as markets that carry hours text, at most `limit`.
    fn market_places_with_hours(&self, limit: usize) -> Result<Vec<Place>, StorageError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.is_market && p.has_hours())
            .take(limit)
            .collect())
    }
}

/// Generated occurrences.
pub trait EventStore {
    fn insert(&mut self, occurrences: &[Occurrence]) -> Result<usize, StorageError>;

    /// Delete a place's occurrences from `source` starting inside `window`.
    fn delete_window(
        &mut self,
        place_id: &PlaceId,
        source: &str,
        window: &Window,
    ) -> Result<usize, StorageError>;

    /// A place's occurrences starting in `[from, to]`, ordered by start.
    fn query(
        &self,
        place_id: &PlaceId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Occurrence>, StorageError>;

    /// Window-scoped replace: delete then insert.
    ///
    /// Returns `(deleted, inserted)`. An interruption between the two steps
    /// leaves a gap, never duplicates.
    fn replace_window(
        &mut self,
        place_id: &PlaceId,
        source: &str,
        window: &Window,
        occurrences: &[Occurrence],
    ) -> Result<(usize, usize), StorageError> {
        let deleted = self.delete_window(place_id, source, window)?;
        let inserted = self.insert(occurrences)?;
        Ok((deleted, inserted))
    }
}

/// Whether `occurrence` is one `delete_window` would remove.
pub(crate) fn in_replace_scope(
    occurrence: &Occurrence,
    place_id: &PlaceId,
    source: &str,
    window: &Window,
) -> bool {
    &occurrence.place_id == place_id
        && occurrence.source == source
        && window.contains(occurrence.start_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.places_path(), PathBuf::from("/data/places.jsonl"));
        assert_eq!(config.events_path(), PathBuf::from("/data/market_events.jsonl"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
