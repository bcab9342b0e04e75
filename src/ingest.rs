//! Provider record ingestion.
//!
//! Converts provider place records into [`Place`] rows. Records whose names
//! are not market candidates are dropped; the rest are stored with the
//! market flag set from the classifier's verdict. A `Store` verdict also
//! purges the place's generated occurrences in the look-ahead window, the
//! same purge an enrichment run applies.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::config::AppConfig;
use crate::hours::HoursParser;
use crate::materialize::Window;
use crate::models::{Place, Verdict};
use crate::storage::{EventStore, PlaceStore, StorageError};

/// Errors from loading or storing provider records.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read provider file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider file is not a JSON array of places: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Provider-side opening hours block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// One place as delivered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPlace {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub opening_hours: Option<ProviderHours>,
}

impl ProviderPlace {
    pub fn weekday_text(&self) -> &[String] {
        self.opening_hours
            .as_ref()
            .map(|h| h.weekday_text.as_slice())
            .unwrap_or_default()
    }
}

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub received: usize,
    pub markets: usize,
    pub stores: usize,
    pub skipped: usize,
    /// Records that replaced an existing place
    pub updated: usize,
    /// Generated occurrences purged for places now classed as stores
    pub events_deleted: usize,
}

/// Screens provider records into the place store.
pub struct Ingestor {
    classifier: Classifier,
    open_day_threshold: usize,
    provider: String,
    /// Source tag of the occurrences a store verdict purges
    event_source: String,
    window_days: u32,
}

impl Ingestor {
    pub fn new(
        classifier: Classifier,
        open_day_threshold: usize,
        provider: impl Into<String>,
        event_source: impl Into<String>,
        window_days: u32,
    ) -> Self {
        Self {
            classifier,
            open_day_threshold,
            provider: provider.into(),
            event_source: event_source.into(),
            window_days,
        }
    }

    /// Ingestor using the ingest profile of `config`; purges follow the
    /// enrichment source and window.
    pub fn from_config(config: &AppConfig, provider: Option<&str>) -> Self {
        let parser = HoursParser::new(config.parser.clone());
        Self::new(
            Classifier::new(config.classifier.clone(), parser),
            config.ingest.open_day_threshold,
            provider.unwrap_or(config.ingest.default_provider.as_str()),
            config.enrich.source.clone(),
            config.enrich.window_days,
        )
    }

    pub fn ingest<P: PlaceStore, E: EventStore>(
        &self,
        store: &mut P,
        events: &mut E,
        records: &[ProviderPlace],
        now: NaiveDateTime,
    ) -> Result<IngestResult, IngestError> {
        let window = Window::forward(now, self.window_days);
        let mut result = IngestResult {
            received: records.len(),
            ..IngestResult::default()
        };

        for record in records {
            let verdict = self.classifier.classify(
                &record.name,
                &record.types,
                record.weekday_text(),
                self.open_day_threshold,
            );

            match verdict {
                Verdict::Excluded => {
                    debug!(name = %record.name, "Not a market candidate, skipping");
                    result.skipped += 1;
                    continue;
                }
                Verdict::Market => result.markets += 1,
                Verdict::Store => result.stores += 1,
            }

            let mut place = Place::new(
                record.name.clone(),
                self.provider.clone(),
                record.place_id.clone(),
            )
            .with_categories(record.types.clone())
            .with_opening_hours(record.weekday_text().to_vec())
            .with_market_flag(verdict.is_market());

            if let Some(existing) = store.get(&place.id)? {
                place.created_at = existing.created_at;
                result.updated += 1;
            }
            let place_id = place.id.clone();
            store.upsert(place)?;

            if verdict == Verdict::Store {
                let deleted = events.delete_window(&place_id, &self.event_source, &window)?;
                if deleted > 0 {
                    info!(place = %place_id, deleted, "Purged occurrences of place classed as store");
                }
                result.events_deleted += deleted;
            }
        }

        info!(
            provider = %self.provider,
            received = result.received,
            markets = result.markets,
            stores = result.stores,
            skipped = result.skipped,
            events_deleted = result.events_deleted,
            "Ingested provider places"
        );
        Ok(result)
    }
}

/// Read a JSON array of provider places.
pub fn load_provider_file(path: &Path) -> Result<Vec<ProviderPlace>, IngestError> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<ProviderPlace> = serde_json::from_str(&contents)?;
    Ok(records)
}
