//! Hour/minute extraction from a single time token.

use std::sync::LazyLock;

use regex::Regex;

use super::{normalize_hours_text, HoursError, HoursParser};
use crate::models::TimeOfDay;

/// Unanchored: the first `h[:mm][ ][suffix]` wins, surrounding noise is ignored.
/// The suffix is the whole letter/dot run; only its leading marker counts.
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*([a-z][a-z.]*)?").expect("time token pattern")
});

/// Best-effort hour policy for tokens without am/pm: pull into 0..=23.
pub fn clamp_hour(hour: i64) -> u32 {
    hour.clamp(0, 23) as u32
}

/// Minutes above 59 are pulled back to 59 so the time stays on the clock.
pub fn clamp_minute(minute: i64) -> u32 {
    minute.clamp(0, 59) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl HoursParser {
    /// Parse the first time found in `token`.
    ///
    /// `"2:30pm"` is 14:30, `"12am"` is 00:00, `"09:00"` is 09:00, and a bare
    /// `"27"` is clamped to 23:00.
    pub fn parse_time(&self, token: &str) -> Result<TimeOfDay, HoursError> {
        let normalized = normalize_hours_text(token);
        let caps = TIME_TOKEN
            .captures(&normalized)
            .ok_or_else(|| HoursError::NoTimeFound(token.to_string()))?;

        let hour: i64 = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| HoursError::NoTimeFound(token.to_string()))?;
        let minute: i64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        let hour = match caps.get(3).and_then(|m| self.meridiem(m.as_str())) {
            Some(Meridiem::Am) => (hour % 12) as u32,
            Some(Meridiem::Pm) => (hour % 12) as u32 + 12,
            None => clamp_hour(hour),
        };

        Ok(TimeOfDay::new(hour, clamp_minute(minute)))
    }

    /// Meridiem whose marker begins `suffix`, longest marker first. Trailing
    /// noise after the marker ("1pm.", "5PMish") is ignored.
    fn meridiem(&self, suffix: &str) -> Option<Meridiem> {
        let suffix = suffix.to_lowercase();
        let config = self.config();

        config
            .am_markers
            .iter()
            .map(|m| (m, Meridiem::Am))
            .chain(config.pm_markers.iter().map(|m| (m, Meridiem::Pm)))
            .filter(|(m, _)| !m.is_empty() && suffix.starts_with(&m.to_lowercase()))
            .max_by_key(|(m, _)| m.len())
            .map(|(_, meridiem)| meridiem)
    }
}
