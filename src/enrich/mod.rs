//! Occurrence generation runs.
//!
//! [`Engine::classify_and_materialize`] is the pure step: one place's name,
//! categories and hours text in, a verdict and occurrences out.
//! [`Enricher`] drives it over the place store and applies each verdict:
//!
//! - `Market`: replace the place's occurrences inside the window
//! - `Store`: purge them and clear the market flag
//! - `Excluded`: touch nothing

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{Classifier, PlaceSignals};
use crate::config::{AppConfig, EnrichConfig};
use crate::hours::HoursParser;
use crate::materialize::{DayRestriction, Materializer, Window};
use crate::models::{Occurrence, Place, PlaceId, Verdict};
use crate::storage::{EventStore, PlaceStore, StorageError};

/// The inputs classification reads from a place.
#[derive(Debug, Clone, Copy)]
pub struct PlaceHours<'a> {
    pub place_id: &'a PlaceId,
    pub name: &'a str,
    pub categories: &'a [String],
    pub lines: &'a [String],
}

impl<'a> From<&'a Place> for PlaceHours<'a> {
    fn from(place: &'a Place) -> Self {
        Self {
            place_id: &place.id,
            name: &place.name,
            categories: &place.categories,
            lines: &place.opening_hours_text,
        }
    }
}

/// Result of classifying one place.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub verdict: Verdict,
    pub signals: PlaceSignals,
    pub window: Window,
    /// Empty unless the verdict is `Market`
    pub occurrences: Vec<Occurrence>,
}

/// Parser, classifier and materializer wired to one configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    classifier: Classifier,
    materializer: Materializer,
    open_day_threshold: usize,
}

impl Engine {
    pub fn new(classifier: Classifier, materializer: Materializer, open_day_threshold: usize) -> Self {
        Self {
            classifier,
            materializer,
            open_day_threshold,
        }
    }

    /// Engine using the enrichment profile of `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let parser = HoursParser::new(config.parser.clone());
        Self::new(
            Classifier::new(config.classifier.clone(), parser),
            Materializer::new(config.enrich.source.clone()),
            config.enrich.open_day_threshold,
        )
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn source(&self) -> &str {
        self.materializer.source()
    }

    /// Classify a place and, for markets, expand its hours over the window
    /// `[now, now + window_days]` (window clamped to 7..=60 days).
    pub fn classify_and_materialize(
        &self,
        place: PlaceHours<'_>,
        now: NaiveDateTime,
        window_days: u32,
        restrict_to: &DayRestriction,
    ) -> Outcome {
        let window = Window::forward(now, window_days);
        let signals = self.classifier.signals(
            place.name,
            place.categories,
            place.lines,
            self.open_day_threshold,
        );
        let verdict = signals.verdict();

        let occurrences = match verdict {
            Verdict::Market => {
                let rules = self.classifier.parser().parse_week(place.lines);
                self.materializer
                    .materialize(place.place_id, &rules, &window, restrict_to)
            }
            Verdict::Store | Verdict::Excluded => Vec::new(),
        };

        debug!(
            place = %place.place_id,
            name = place.name,
            %verdict,
            occurrences = occurrences.len(),
            "Classified place"
        );

        Outcome {
            verdict,
            signals,
            window,
            occurrences,
        }
    }
}

/// Counters for one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    /// Places selected for the run
    pub processed: usize,
    pub markets_with_hours: usize,
    pub markets_with_occurrences: usize,
    pub occurrences_total: usize,
    /// Rows written to the event store (0 on dry runs)
    pub events_created: usize,
    /// Rows removed by window replacement or store purges
    pub events_deleted: usize,
    pub flipped_to_store: usize,
    pub excluded: usize,
    pub errors: Vec<String>,
}

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub window_days: u32,
    pub restriction: DayRestriction,
    pub limit: usize,
    pub dry_run: bool,
}

impl From<&EnrichConfig> for RunOptions {
    fn from(config: &EnrichConfig) -> Self {
        Self {
            window_days: config.window_days,
            restriction: if config.weekend_only {
                DayRestriction::WeekendOnly
            } else {
                DayRestriction::Any
            },
            limit: config.limit,
            dry_run: false,
        }
    }
}

/// Batch driver over the stores.
pub struct Enricher {
    engine: Engine,
    options: RunOptions,
}

impl Enricher {
    pub fn new(engine: Engine, options: RunOptions) -> Self {
        Self { engine, options }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Engine::from_config(config), RunOptions::from(&config.enrich))
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.options.dry_run = dry_run;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Classify every market-flagged place with hours and apply the verdicts.
    ///
    /// A store failure on one place is logged and recorded in the summary;
    /// the run continues with the next place.
    pub fn run<P: PlaceStore, E: EventStore>(
        &self,
        places: &mut P,
        events: &mut E,
        now: NaiveDateTime,
    ) -> Result<EnrichSummary, StorageError> {
        let selected = places.market_places_with_hours(self.options.limit.max(1))?;
        let mut summary = EnrichSummary {
            processed: selected.len(),
            ..EnrichSummary::default()
        };

        info!(
            places = selected.len(),
            window_days = self.options.window_days,
            dry_run = self.options.dry_run,
            "Starting enrichment run"
        );

        for place in &selected {
            summary.markets_with_hours += 1;
            let outcome = self.engine.classify_and_materialize(
                PlaceHours::from(place),
                now,
                self.options.window_days,
                &self.options.restriction,
            );

            match outcome.verdict {
                Verdict::Market if !outcome.occurrences.is_empty() => {
                    summary.markets_with_occurrences += 1;
                    summary.occurrences_total += outcome.occurrences.len();
                }
                Verdict::Store => summary.flipped_to_store += 1,
                Verdict::Excluded => summary.excluded += 1,
                Verdict::Market => {}
            }

            if self.options.dry_run {
                continue;
            }

            if let Err(e) = self.apply(places, events, &place.id, &outcome, &mut summary) {
                let err = format!("{} ({}): {}", place.name, place.id, e);
                warn!("Failed to apply verdict: {}", err);
                summary.errors.push(err);
            }
        }

        info!(
            processed = summary.processed,
            occurrences = summary.occurrences_total,
            created = summary.events_created,
            flipped_to_store = summary.flipped_to_store,
            "Enrichment run complete"
        );
        Ok(summary)
    }

    /// Write one place's outcome to the stores.
    pub fn apply<P: PlaceStore, E: EventStore>(
        &self,
        places: &mut P,
        events: &mut E,
        place_id: &PlaceId,
        outcome: &Outcome,
        summary: &mut EnrichSummary,
    ) -> Result<(), StorageError> {
        let source = self.engine.source();
        match outcome.verdict {
            Verdict::Market => {
                let (deleted, inserted) =
                    events.replace_window(place_id, source, &outcome.window, &outcome.occurrences)?;
                summary.events_deleted += deleted;
                summary.events_created += inserted;
            }
            Verdict::Store => {
                summary.events_deleted += events.delete_window(place_id, source, &outcome.window)?;
                places.set_market_flag(place_id, false)?;
                info!(place = %place_id, "Hours look like a store, cleared market flag");
            }
            Verdict::Excluded => {}
        }
        Ok(())
    }
}
