//! Weekly rule expansion into dated occurrences.
//!
//! Everything here is naive local wall-clock time. Weekly steps are whole
//! calendar days, so a Saturday 08:00 rule stays at 08:00 every week.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::clamp_window_days;
use crate::models::{is_weekend, DayRule, Occurrence, PlaceId, OPENING_HOURS_SOURCE};

/// Closed look-ahead range `[start, end]` occurrences are generated for and
/// replaced within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub days: u32,
}

impl Window {
    /// Window of `days` (clamped to 7..=60) starting at `now`.
    pub fn forward(now: NaiveDateTime, days: u32) -> Self {
        let days = clamp_window_days(days);
        Self {
            start: now,
            end: now + Duration::days(i64::from(days)),
            days,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Which weekdays occurrences may fall on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayRestriction {
    #[default]
    Any,
    WeekendOnly,
    Only(Vec<Weekday>),
}

impl DayRestriction {
    pub fn allows(&self, weekday: Weekday) -> bool {
        match self {
            DayRestriction::Any => true,
            DayRestriction::WeekendOnly => is_weekend(weekday),
            DayRestriction::Only(days) => days.contains(&weekday),
        }
    }
}

/// First `weekday` at `time` strictly after `now`.
///
/// When today is the weekday but the time has already passed (or is exactly
/// now), the result is a week out.
pub fn next_occurrence(now: NaiveDateTime, weekday: Weekday, time: NaiveTime) -> NaiveDateTime {
    let today = now.weekday().num_days_from_sunday();
    let diff = (weekday.num_days_from_sunday() + 7 - today) % 7;
    let candidate = (now.date() + Duration::days(i64::from(diff))).and_time(time);

    if candidate <= now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

/// Closing timestamp for an occurrence starting at `start`.
///
/// An end time not strictly after the start on the same date belongs to the
/// following day (e.g. 22:00-02:00).
pub fn occurrence_end(start: NaiveDateTime, end: NaiveTime) -> NaiveDateTime {
    let candidate = start.date().and_time(end);
    if candidate <= start {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}

/// Expands day rules into occurrences tagged with a generation source.
#[derive(Debug, Clone)]
pub struct Materializer {
    source: String,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(OPENING_HOURS_SOURCE)
    }
}

impl Materializer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every occurrence of every allowed rule starting inside `window`.
    ///
    /// Output is ordered by start time with exact duplicates removed, so the
    /// same inputs always give the same set. Every occurrence id is unique.
    pub fn materialize(
        &self,
        place_id: &PlaceId,
        rules: &[DayRule],
        window: &Window,
        restriction: &DayRestriction,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        for rule in rules {
            if !restriction.allows(rule.weekday) {
                continue;
            }

            let mut cursor = next_occurrence(window.start, rule.weekday, rule.start.to_naive_time());
            while cursor <= window.end {
                let end = rule
                    .end
                    .map(|end| occurrence_end(cursor, end.to_naive_time()));
                occurrences.push(Occurrence::new(
                    place_id.clone(),
                    &self.source,
                    rule.weekday,
                    cursor,
                    end,
                    window.start,
                ));
                cursor += Duration::days(7);
            }
        }

        occurrences.sort_by(|a, b| (a.start_at, a.end_at).cmp(&(b.start_at, b.end_at)));
        occurrences.dedup_by(|a, b| a.id == b.id);

        debug!(
            place = %place_id,
            rules = rules.len(),
            occurrences = occurrences.len(),
            "Materialized occurrences"
        );
        occurrences
    }
}
