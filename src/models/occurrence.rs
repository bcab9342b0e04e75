//! Concrete dated instance of a recurring market.

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{weekday_code, weekly_rule, EntityId, OccurrenceId, PlaceId};

/// Default generation source for occurrences derived from opening hours.
pub const OPENING_HOURS_SOURCE: &str = "opening_hours";

const ID_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// One stored market occurrence.
///
/// Timestamps are naive local wall-clock times in the provider's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Deterministic ID from place, source, start and end
    pub id: OccurrenceId,

    pub place_id: PlaceId,

    pub start_at: NaiveDateTime,

    pub end_at: Option<NaiveDateTime>,

    /// Two-letter day code (e.g. "SA")
    pub weekday_code: String,

    /// e.g. "FREQ=WEEKLY;BYDAY=SA"
    pub recurrence_rule: String,

    /// Generation source tag, scopes safe deletion
    pub source: String,

    pub last_verified_at: NaiveDateTime,
}

impl Occurrence {
    pub fn new(
        place_id: PlaceId,
        source: &str,
        weekday: Weekday,
        start_at: NaiveDateTime,
        end_at: Option<NaiveDateTime>,
        verified_at: NaiveDateTime,
    ) -> Self {
        let end = end_at
            .map(|end| end.format(ID_TIME_FORMAT).to_string())
            .unwrap_or_default();
        let id = EntityId::generate(&[
            place_id.as_str(),
            source,
            &start_at.format(ID_TIME_FORMAT).to_string(),
            &end,
        ]);

        Self {
            id,
            place_id,
            start_at,
            end_at,
            weekday_code: weekday_code(weekday).to_string(),
            recurrence_rule: weekly_rule(weekday),
            source: source.to_string(),
            last_verified_at: verified_at,
        }
    }
}
