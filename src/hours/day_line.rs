//! Weekday line parsing: "Saturday: 8am-1pm" -> DayRule.

use tracing::debug;

use super::{normalize_hours_text, HoursParser};
use crate::models::DayRule;

/// Why a line produced no rule. Skips are expected, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySkip {
    /// No `:` between day name and hours
    NoSeparator,
    /// Prefix is not a configured weekday name
    UnknownDay(String),
    /// Remainder is empty
    NoHours,
    /// Remainder is a closed marker
    Closed,
    /// Start time could not be read
    NoStartTime(String),
}

/// Split a normalized line at its first colon into (day, remainder), both trimmed.
pub fn split_day_line(normalized: &str) -> Option<(&str, &str)> {
    let (day, rest) = normalized.split_once(':')?;
    Some((day.trim(), rest.trim()))
}

impl HoursParser {
    /// Parse one provider line, or `None` when it should be skipped.
    pub fn parse_day_line(&self, line: &str) -> Option<DayRule> {
        match self.try_day_line(line) {
            Ok(rule) => Some(rule),
            Err(skip) => {
                debug!(?skip, line, "Skipping hours line");
                None
            }
        }
    }

    /// Like [`parse_day_line`](Self::parse_day_line) but reports the skip reason.
    pub fn try_day_line(&self, line: &str) -> Result<DayRule, DaySkip> {
        let normalized = normalize_hours_text(line);
        let (day_raw, remainder) = split_day_line(&normalized).ok_or(DaySkip::NoSeparator)?;

        let weekday = self
            .weekday(day_raw)
            .ok_or_else(|| DaySkip::UnknownDay(day_raw.to_string()))?;

        if remainder.is_empty() {
            return Err(DaySkip::NoHours);
        }
        if self.is_closed(remainder) {
            return Err(DaySkip::Closed);
        }
        if self.is_full_day(remainder) {
            return Ok(DayRule::full_day(weekday));
        }

        let mut parts = remainder.splitn(2, '-').map(str::trim);
        let start_raw = parts.next().unwrap_or_default();
        let start = self
            .parse_time(start_raw)
            .map_err(|_| DaySkip::NoStartTime(start_raw.to_string()))?;
        // An unreadable closing time degrades to "no end" rather than dropping the day.
        let end = parts.next().and_then(|raw| self.parse_time(raw).ok());

        Ok(DayRule::new(weekday, start, end))
    }

    /// Parse every line, dropping the ones that skip.
    pub fn parse_week<S: AsRef<str>>(&self, lines: &[S]) -> Vec<DayRule> {
        lines
            .iter()
            .filter_map(|line| self.parse_day_line(line.as_ref()))
            .collect()
    }

    fn weekday(&self, name: &str) -> Option<chrono::Weekday> {
        self.config()
            .weekdays
            .get(name.to_lowercase().as_str())
            .copied()
    }
}
