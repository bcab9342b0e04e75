//! Open duration of a single day's range, in hours.

use super::{normalize_hours_text, HoursParser};

impl HoursParser {
    /// Hours between start and end of a range like "9am-5pm".
    ///
    /// Returns `None` when the range has no end, a part does not parse, or
    /// the end is not after the start. Overnight ranges are not modeled as
    /// positive durations.
    pub fn duration_hours(&self, remainder: &str) -> Option<f64> {
        let normalized = normalize_hours_text(remainder);
        if self.is_full_day(&normalized) {
            return Some(24.0);
        }

        let (start_raw, end_raw) = normalized.split_once('-')?;
        let start = self.parse_time(start_raw.trim()).ok()?;
        let end = self.parse_time(end_raw.trim()).ok()?;

        let span = end.minutes_of_day() as i64 - start.minutes_of_day() as i64;
        if span <= 0 {
            return None;
        }
        Some(span as f64 / 60.0)
    }
}
