//! Market/store classification.
//!
//! Two independent signal sources feed the verdict: the place's name and
//! category tags, and the shape of its weekly hours. A farmers market is
//! open a few hours one or two days a week; a store is open long days most
//! of the week.

use serde::Serialize;
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::hours::{normalize_hours_text, split_day_line, HoursParser};
use crate::models::Verdict;

/// Day counts behind the hours-based store check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeekShape {
    /// Lines supplied (parseable or not)
    pub lines: usize,
    /// Lines with a day/hours split that are not closed
    pub open_days: usize,
    /// Open days at least `long_day_hours` long
    pub long_days: usize,
}

/// Everything the verdict depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaceSignals {
    pub name_is_market: bool,
    pub supermarket: bool,
    /// First exclusion token found in the name
    pub excluded_name_token: Option<String>,
    /// First excluded category tag present
    pub excluded_category: Option<String>,
    pub hours_look_like_store: bool,
}

impl PlaceSignals {
    /// Market only when named like one and nothing argues against it.
    pub fn verdict(&self) -> Verdict {
        if !self.name_is_market {
            return Verdict::Excluded;
        }

        let blocked = self.supermarket
            || self.excluded_name_token.is_some()
            || self.excluded_category.is_some()
            || self.hours_look_like_store;

        if blocked {
            Verdict::Store
        } else {
            Verdict::Market
        }
    }
}

/// Applies the configured heuristics.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    parser: HoursParser,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), HoursParser::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig, parser: HoursParser) -> Self {
        Self { config, parser }
    }

    pub fn parser(&self) -> &HoursParser {
        &self.parser
    }

    /// Count open and long days across the supplied lines.
    pub fn week_shape<S: AsRef<str>>(&self, lines: &[S]) -> WeekShape {
        let mut shape = WeekShape {
            lines: lines.len(),
            ..WeekShape::default()
        };

        for line in lines {
            let normalized = normalize_hours_text(line.as_ref());
            let Some((_, remainder)) = split_day_line(&normalized) else {
                continue;
            };
            if remainder.is_empty() || self.parser.is_closed(remainder) {
                continue;
            }

            shape.open_days += 1;
            if let Some(hours) = self.parser.duration_hours(remainder) {
                if hours >= self.config.long_day_hours {
                    shape.long_days += 1;
                }
            }
        }

        shape
    }

    /// Whether a full week of hours looks like a permanently-open store.
    ///
    /// `open_day_threshold` is clamped to 1..=7.
    pub fn is_likely_store_by_hours<S: AsRef<str>>(
        &self,
        lines: &[S],
        open_day_threshold: usize,
    ) -> bool {
        let shape = self.week_shape(lines);
        shape.lines >= self.config.min_week_lines
            && shape.open_days >= open_day_threshold.clamp(1, 7)
            && shape.long_days >= self.config.long_day_threshold
    }

    pub fn is_market_by_name(&self, name: &str) -> bool {
        name.to_lowercase()
            .contains(&self.config.market_token.to_lowercase())
    }

    pub fn is_supermarket<C: AsRef<str>>(&self, name: &str, categories: &[C]) -> bool {
        let by_category = categories.iter().any(|c| {
            self.config
                .supermarket_categories
                .iter()
                .any(|s| s.eq_ignore_ascii_case(c.as_ref().trim()))
        });
        if by_category {
            return true;
        }

        let name = name.to_lowercase();
        self.config
            .supermarket_name_tokens
            .iter()
            .any(|t| name.contains(&t.to_lowercase()))
    }

    pub fn excluded_name_token(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.config
            .name_excludes
            .iter()
            .find(|t| name.contains(&t.to_lowercase()))
            .map(String::as_str)
    }

    pub fn excluded_category<C: AsRef<str>>(&self, categories: &[C]) -> Option<&str> {
        self.config
            .category_excludes
            .iter()
            .find(|excluded| {
                categories
                    .iter()
                    .any(|c| excluded.eq_ignore_ascii_case(c.as_ref().trim()))
            })
            .map(String::as_str)
    }

    /// Gather every signal for one place.
    pub fn signals<C: AsRef<str>, S: AsRef<str>>(
        &self,
        name: &str,
        categories: &[C],
        lines: &[S],
        open_day_threshold: usize,
    ) -> PlaceSignals {
        PlaceSignals {
            name_is_market: self.is_market_by_name(name),
            supermarket: self.is_supermarket(name, categories),
            excluded_name_token: self.excluded_name_token(name).map(str::to_string),
            excluded_category: self.excluded_category(categories).map(str::to_string),
            hours_look_like_store: self.is_likely_store_by_hours(lines, open_day_threshold),
        }
    }

    pub fn classify<C: AsRef<str>, S: AsRef<str>>(
        &self,
        name: &str,
        categories: &[C],
        lines: &[S],
        open_day_threshold: usize,
    ) -> Verdict {
        let signals = self.signals(name, categories, lines, open_day_threshold);
        let verdict = signals.verdict();
        debug!(name, %verdict, ?signals, "Classified place");
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NO_CATEGORIES: [&str; 0] = [];
    const NO_HOURS: [&str; 0] = [];

    fn classifier() -> Classifier {
        Classifier::default()
    }

    fn week(hours: &str) -> Vec<String> {
        [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ]
        .iter()
        .map(|day| format!("{}: {}", day, hours))
        .collect()
    }

    fn saturday_market_week() -> Vec<String> {
        vec![
            "Monday: Closed".to_string(),
            "Tuesday: Closed".to_string(),
            "Wednesday: Closed".to_string(),
            "Thursday: Closed".to_string(),
            "Friday: Closed".to_string(),
            "Saturday: 8am-1pm".to_string(),
            "Sunday: Closed".to_string(),
        ]
    }

    #[test]
    fn test_store_hours_every_day_long() {
        assert!(classifier().is_likely_store_by_hours(&week("9am-6pm"), 5));
        assert!(classifier().is_likely_store_by_hours(&week("9am-6pm"), 7));
    }

    #[test]
    fn test_short_days_are_not_store_hours() {
        let mut lines = week("9am-1pm");
        lines[5] = "Saturday: Closed".to_string();
        lines[6] = "Sunday: Closed".to_string();
        assert!(!classifier().is_likely_store_by_hours(&lines, 5));
    }

    #[test]
    fn test_open_day_threshold_is_a_parameter() {
        let mut lines = week("9am-6pm");
        lines[6] = "Sunday: Closed".to_string();

        assert_eq!(
            classifier().week_shape(&lines),
            WeekShape {
                lines: 7,
                open_days: 6,
                long_days: 6
            }
        );
        assert!(classifier().is_likely_store_by_hours(&lines, 5));
        assert!(!classifier().is_likely_store_by_hours(&lines, 7));
    }

    #[test]
    fn test_fewer_than_seven_lines_is_never_store() {
        let lines = week("9am-9pm");
        assert!(!classifier().is_likely_store_by_hours(&lines[..6], 5));
    }

    #[test]
    fn test_full_day_counts_as_long() {
        let shape = classifier().week_shape(&week("Open 24 hours"));
        assert_eq!(shape.long_days, 7);
    }

    #[test]
    fn test_unparseable_ranges_count_open_not_long() {
        let shape = classifier().week_shape(&week("by appointment"));
        assert_eq!(shape.open_days, 7);
        assert_eq!(shape.long_days, 0);
    }

    #[test]
    fn test_farmers_market_is_market() {
        let verdict = classifier().classify(
            "Riverside Farmers Market",
            &["point_of_interest"],
            &saturday_market_week(),
            5,
        );
        assert_eq!(verdict, Verdict::Market);
    }

    #[test]
    fn test_supermarket_is_store_regardless_of_hours() {
        let c = classifier();
        assert_eq!(
            c.classify("SuperValue Supermarket", &["supermarket"], &saturday_market_week(), 5),
            Verdict::Store
        );
        assert_eq!(
            c.classify("SuperValue Supermarket", &["supermarket"], &NO_HOURS, 5),
            Verdict::Store
        );
    }

    #[test]
    fn test_no_market_in_name_is_excluded() {
        assert_eq!(
            classifier().classify("Lakeside Cafe", &NO_CATEGORIES, &saturday_market_week(), 5),
            Verdict::Excluded
        );
    }

    #[test]
    fn test_market_with_store_hours_is_store() {
        assert_eq!(
            classifier().classify("Dockside Market", &NO_CATEGORIES, &week("8am-8pm"), 5),
            Verdict::Store
        );
    }

    #[test]
    fn test_name_and_category_exclusions() {
        let c = classifier();
        assert_eq!(c.excluded_name_token("Market Street Cafe"), Some("cafe"));
        assert_eq!(c.excluded_category(&["food", "Restaurant"]), Some("restaurant"));
        assert_eq!(
            c.classify("Night Market Eatery", &["restaurant"], &NO_HOURS, 5),
            Verdict::Store
        );
        assert_eq!(
            c.classify("Harbour Market Wharf", &NO_CATEGORIES, &NO_HOURS, 5),
            Verdict::Store
        );
    }

    #[test]
    fn test_supermarket_detection_by_name_spacing() {
        let c = classifier();
        assert!(c.is_supermarket("Budget Super Market", &NO_CATEGORIES));
        assert!(c.is_supermarket("Fresh Foods", &["grocery_or_supermarket"]));
        assert!(!c.is_supermarket("Village Market", &["point_of_interest"]));
    }

    #[test]
    fn test_no_hours_classifies_on_name_alone() {
        assert_eq!(
            classifier().classify("Matakana Village Market", &NO_CATEGORIES, &NO_HOURS, 7),
            Verdict::Market
        );
    }

    #[test]
    fn test_verdict_is_pure_over_signals() {
        let base = PlaceSignals {
            name_is_market: true,
            ..PlaceSignals::default()
        };
        assert_eq!(base.verdict(), Verdict::Market);

        let store = PlaceSignals {
            hours_look_like_store: true,
            ..base.clone()
        };
        assert_eq!(store.verdict(), Verdict::Store);

        let not_candidate = PlaceSignals {
            supermarket: true,
            ..PlaceSignals::default()
        };
        assert_eq!(not_candidate.verdict(), Verdict::Excluded);
    }

    #[test]
    fn test_custom_vocabulary() {
        let config = ClassifierConfig {
            market_token: "markt".to_string(),
            name_excludes: vec!["laden".to_string()],
            ..ClassifierConfig::default()
        };
        let c = Classifier::new(config, HoursParser::default());
        assert!(c.is_market_by_name("Wochenmarkt Altstadt"));
        assert_eq!(
            c.classify("Marktladen", &NO_CATEGORIES, &NO_HOURS, 5),
            Verdict::Store
        );
    }
}
