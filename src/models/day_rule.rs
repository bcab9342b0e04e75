//! Parsed weekly opening rule for a single weekday.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::TimeOfDay;

/// One weekday's open window, parsed from a provider hours line.
///
/// A "closed" line never produces a rule, so `start` is always present.
/// `end` is absent when the closing time is missing or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayRule {
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: Option<TimeOfDay>,
}

impl DayRule {
    pub fn new(weekday: Weekday, start: TimeOfDay, end: Option<TimeOfDay>) -> Self {
        Self {
            weekday,
            start,
            end,
        }
    }

    /// Rule for a "24 hours" line: 00:00 to 23:59.
    pub fn full_day(weekday: Weekday) -> Self {
        Self::new(weekday, TimeOfDay::MIDNIGHT, Some(TimeOfDay::END_OF_DAY))
    }

    /// Sunday-based weekday number (Sunday = 0).
    pub fn weekday_index(&self) -> u32 {
        self.weekday.num_days_from_sunday()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_day_rule() {
        let rule = DayRule::full_day(Weekday::Tue);
        assert_eq!(rule.start, TimeOfDay::new(0, 0));
        assert_eq!(rule.end, Some(TimeOfDay::new(23, 59)));
    }

    #[test]
    fn test_weekday_index_is_sunday_based() {
        let sunday = DayRule::new(Weekday::Sun, TimeOfDay::new(8, 0), None);
        let saturday = DayRule::new(Weekday::Sat, TimeOfDay::new(8, 0), None);
        assert_eq!(sunday.weekday_index(), 0);
        assert_eq!(saturday.weekday_index(), 6);
    }
}
