//! Opening-hours text parsing.
//!
//! Turns provider weekday lines ("Saturday: 8:00 AM – 1:00 PM") into
//! [`DayRule`](crate::models::DayRule)s and open durations. Malformed input
//! never fails a whole place: bad lines are skipped and bad end times are
//! dropped.

mod day_line;
mod duration;
mod normalize;
mod time_of_day;

pub use day_line::{split_day_line, DaySkip};
pub use normalize::normalize_hours_text;
pub use time_of_day::{clamp_hour, clamp_minute};

use thiserror::Error;

use crate::config::ParserConfig;

/// Errors from parsing a single time token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HoursError {
    #[error("No time found in {0:?}")]
    NoTimeFound(String),
}

/// Parser bound to a weekday/meridiem vocabulary.
#[derive(Debug, Clone)]
pub struct HoursParser {
    config: ParserConfig,
}

impl Default for HoursParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl HoursParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Remainder is exactly a closed marker ("Closed").
    pub fn is_closed(&self, remainder: &str) -> bool {
        self.config
            .closed_markers
            .iter()
            .any(|m| m.eq_ignore_ascii_case(remainder.trim()))
    }

    /// Remainder mentions a full-day marker ("Open 24 hours").
    pub fn is_full_day(&self, remainder: &str) -> bool {
        let lower = remainder.to_lowercase();
        self.config
            .full_day_markers
            .iter()
            .any(|m| lower.contains(&m.to_lowercase()))
    }
}
