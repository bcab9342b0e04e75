//! In-memory stores.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};

use super::{in_replace_scope, EventStore, PlaceStore, StorageError};
use crate::materialize::Window;
use crate::models::{Occurrence, Place, PlaceId};

/// Places kept in id order.
#[derive(Debug, Default, Clone)]
pub struct MemoryPlaceStore {
    places: BTreeMap<PlaceId, Place>,
}

impl MemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_places(places: impl IntoIterator<Item = Place>) -> Self {
        Self {
            places: places.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl PlaceStore for MemoryPlaceStore {
    fn get(&self, id: &PlaceId) -> Result<Option<Place>, StorageError> {
        Ok(self.places.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Place>, StorageError> {
        Ok(self.places.values().cloned().collect())
    }

    fn upsert(&mut self, place: Place) -> Result<(), StorageError> {
        self.places.insert(place.id.clone(), place);
        Ok(())
    }

    fn set_market_flag(&mut self, id: &PlaceId, is_market: bool) -> Result<(), StorageError> {
        let place = self
            .places
            .get_mut(id)
            .ok_or_else(|| StorageError::PlaceNotFound(id.clone()))?;
        place.is_market = is_market;
        place.updated_at = Utc::now();
        Ok(())
    }
}

/// Occurrences in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventStore {
    occurrences: Vec<Occurrence>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

impl EventStore for MemoryEventStore {
    fn insert(&mut self, occurrences: &[Occurrence]) -> Result<usize, StorageError> {
        self.occurrences.extend_from_slice(occurrences);
        Ok(occurrences.len())
    }

    fn delete_window(
        &mut self,
        place_id: &PlaceId,
        source: &str,
        window: &Window,
    ) -> Result<usize, StorageError> {
        let before = self.occurrences.len();
        self.occurrences
            .retain(|o| !in_replace_scope(o, place_id, source, window));
        Ok(before - self.occurrences.len())
    }

    fn query(
        &self,
        place_id: &PlaceId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Occurrence>, StorageError> {
        let mut found: Vec<Occurrence> = self
            .occurrences
            .iter()
            .filter(|o| &o.place_id == place_id && from <= o.start_at && o.start_at <= to)
            .cloned()
            .collect();
        found.sort_by_key(|o| o.start_at);
        Ok(found)
    }
}
