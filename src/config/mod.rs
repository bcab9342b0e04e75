//! Configuration loading and validation.
//!
//! Vocabulary (weekday names, meridiem markers, exclusion lists) lives here
//! rather than in module constants so it can be overridden per region.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest supported look-ahead window.
pub const MIN_WINDOW_DAYS: u32 = 7;

/// Largest supported look-ahead window.
pub const MAX_WINDOW_DAYS: u32 = 60;

/// Upper bound on places processed per enrichment run.
pub const MAX_ENRICH_LIMIT: usize = 500;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Hours-text vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_am_markers")]
    pub am_markers: Vec<String>,

    #[serde(default = "default_pm_markers")]
    pub pm_markers: Vec<String>,

    /// Remainders equal to one of these mean the day is closed
    #[serde(default = "default_closed_markers")]
    pub closed_markers: Vec<String>,

    /// Remainders containing one of these mean open all day
    #[serde(default = "default_full_day_markers")]
    pub full_day_markers: Vec<String>,

    /// Lowercase day name -> weekday
    #[serde(default = "default_weekdays")]
    pub weekdays: BTreeMap<String, Weekday>,
}

fn default_weekdays() -> BTreeMap<String, Weekday> {
    [
        ("sunday", Weekday::Sun),
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sun", Weekday::Sun),
        ("mon", Weekday::Mon),
        ("tue", Weekday::Tue),
        ("wed", Weekday::Wed),
        ("thu", Weekday::Thu),
        ("fri", Weekday::Fri),
        ("sat", Weekday::Sat),
    ]
    .into_iter()
    .map(|(name, day)| (name.to_string(), day))
    .collect()
}

fn default_am_markers() -> Vec<String> {
    vec!["am".to_string(), "a.m.".to_string()]
}

fn default_pm_markers() -> Vec<String> {
    vec!["pm".to_string(), "p.m.".to_string()]
}

fn default_closed_markers() -> Vec<String> {
    vec!["closed".to_string()]
}

fn default_full_day_markers() -> Vec<String> {
    vec!["24 hours".to_string()]
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            weekdays: default_weekdays(),
            am_markers: default_am_markers(),
            pm_markers: default_pm_markers(),
            closed_markers: default_closed_markers(),
            full_day_markers: default_full_day_markers(),
        }
    }
}

/// Market/store heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// A place is only a candidate when its name contains this
    #[serde(default = "default_market_token")]
    pub market_token: String,

    #[serde(default = "default_name_excludes")]
    pub name_excludes: Vec<String>,

    #[serde(default = "default_category_excludes")]
    pub category_excludes: Vec<String>,

    #[serde(default = "default_supermarket_categories")]
    pub supermarket_categories: Vec<String>,

    #[serde(default = "default_supermarket_name_tokens")]
    pub supermarket_name_tokens: Vec<String>,

    /// Hours-based store detection needs at least this many lines
    #[serde(default = "default_min_week_lines")]
    pub min_week_lines: usize,

    /// A day open at least this long counts as a long day
    #[serde(default = "default_long_day_hours")]
    pub long_day_hours: f64,

    /// Long days needed before hours look like a store
    #[serde(default = "default_long_day_threshold")]
    pub long_day_threshold: usize,
}

fn default_market_token() -> String {
    "market".to_string()
}

fn default_name_excludes() -> Vec<String> {
    [
        "store",
        "cafe",
        "bar",
        "office",
        "truck",
        "gallery",
        "kmart",
        "deal",
        "mall",
        "dealonline",
        "asaving",
        "cart",
        "kai",
        "cars",
        "wharf",
        "fishing",
        "tackle",
        "warehouse",
        "garden",
        "nursery",
        "marketplace",
        "supermarket",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_category_excludes() -> Vec<String> {
    vec!["restaurant".to_string()]
}

fn default_supermarket_categories() -> Vec<String> {
    vec![
        "supermarket".to_string(),
        "grocery_or_supermarket".to_string(),
    ]
}

fn default_supermarket_name_tokens() -> Vec<String> {
    vec!["supermarket".to_string(), "super market".to_string()]
}

fn default_min_week_lines() -> usize {
    7
}

fn default_long_day_hours() -> f64 {
    8.0
}

fn default_long_day_threshold() -> usize {
    5
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            market_token: default_market_token(),
            name_excludes: default_name_excludes(),
            category_excludes: default_category_excludes(),
            supermarket_categories: default_supermarket_categories(),
            supermarket_name_tokens: default_supermarket_name_tokens(),
            min_week_lines: default_min_week_lines(),
            long_day_hours: default_long_day_hours(),
            long_day_threshold: default_long_day_threshold(),
        }
    }
}

/// Occurrence generation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Look-ahead window, clamped to 7..=60
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Only generate Saturday/Sunday occurrences
    #[serde(default = "default_weekend_only")]
    pub weekend_only: bool,

    /// Places per run, clamped to 1..=500
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_enrich_open_days")]
    pub open_day_threshold: usize,

    /// Generation source tag written on every occurrence
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_window_days() -> u32 {
    30
}

fn default_weekend_only() -> bool {
    true
}

fn default_limit() -> usize {
    50
}

fn default_enrich_open_days() -> usize {
    5
}

fn default_source() -> String {
    crate::models::OPENING_HOURS_SOURCE.to_string()
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            weekend_only: default_weekend_only(),
            limit: default_limit(),
            open_day_threshold: default_enrich_open_days(),
            source: default_source(),
        }
    }
}

/// Provider ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_open_days")]
    pub open_day_threshold: usize,

    /// Provider name used when the caller does not give one
    #[serde(default = "default_provider")]
    pub default_provider: String,
}

fn default_ingest_open_days() -> usize {
    7
}

fn default_provider() -> String {
    "google".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            open_day_threshold: default_ingest_open_days(),
            default_provider: default_provider(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub enrich: EnrichConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            parser: ParserConfig::default(),
            classifier: ClassifierConfig::default(),
            enrich: EnrichConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Out-of-range numbers are clamped; structural problems are errors.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config.clamped())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.weekdays.is_empty() {
            return Err(ConfigError::ValidationError(
                "parser.weekdays must not be empty".to_string(),
            ));
        }

        if self.parser.am_markers.is_empty() || self.parser.pm_markers.is_empty() {
            return Err(ConfigError::ValidationError(
                "parser.am_markers and parser.pm_markers must not be empty".to_string(),
            ));
        }

        if self.classifier.market_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "classifier.market_token must not be empty".to_string(),
            ));
        }

        if self.enrich.source.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "enrich.source must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Pull numeric settings back into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.enrich.window_days = clamp_window_days(self.enrich.window_days);
        self.enrich.limit = self.enrich.limit.clamp(1, MAX_ENRICH_LIMIT);
        self.enrich.open_day_threshold = clamp_day_count(self.enrich.open_day_threshold);
        self.ingest.open_day_threshold = clamp_day_count(self.ingest.open_day_threshold);
        self.classifier.min_week_lines = clamp_day_count(self.classifier.min_week_lines);
        self.classifier.long_day_threshold = self.classifier.long_day_threshold.min(7);
        self.classifier.long_day_hours = if self.classifier.long_day_hours.is_finite() {
            self.classifier.long_day_hours.clamp(0.0, 24.0)
        } else {
            default_long_day_hours()
        };
        self.parser.weekdays = self
            .parser
            .weekdays
            .into_iter()
            .map(|(name, day)| (name.to_lowercase(), day))
            .collect();
        self
    }
}

/// Clamp a look-ahead window into `MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS`.
pub fn clamp_window_days(days: u32) -> u32 {
    days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)
}

fn clamp_day_count(n: usize) -> usize {
    n.clamp(1, 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.enrich.window_days, 30);
        assert!(config.enrich.weekend_only);
        assert_eq!(config.enrich.source, "opening_hours");
    }

    #[test]
    fn test_open_day_thresholds_differ_per_profile() {
        let config = AppConfig::default();
        assert_eq!(config.enrich.open_day_threshold, 5);
        assert_eq!(config.ingest.open_day_threshold, 7);
    }

    #[test]
    fn test_default_weekdays_cover_week() {
        let parser = ParserConfig::default();
        assert_eq!(parser.weekdays.get("sunday"), Some(&Weekday::Sun));
        assert_eq!(parser.weekdays.get("sat"), Some(&Weekday::Sat));
        let distinct: std::collections::HashSet<_> = parser.weekdays.values().collect();
        assert_eq!(distinct.len(), 7);
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_market_token() {
        let mut config = AppConfig::default();
        config.classifier.market_token = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_is_clamped_not_rejected() {
        let config = AppConfig::from_toml("[enrich]\nwindow_days = 365\nlimit = 0\n").unwrap();
        assert_eq!(config.enrich.window_days, 60);
        assert_eq!(config.enrich.limit, 1);

        let config = AppConfig::from_toml("[enrich]\nwindow_days = 1\n").unwrap();
        assert_eq!(config.enrich.window_days, 7);
    }

    #[test]
    fn test_thresholds_are_clamped() {
        let config = AppConfig::from_toml(
            "[enrich]\nopen_day_threshold = 12\n[classifier]\nlong_day_hours = 30.0\n",
        )
        .unwrap();
        assert_eq!(config.enrich.open_day_threshold, 7);
        assert_eq!(config.classifier.long_day_hours, 24.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            "[classifier]\nname_excludes = [\"depot\"]\n[parser.weekdays]\nZaterdag = \"Sat\"\n",
        )
        .unwrap();
        assert_eq!(config.classifier.name_excludes, vec!["depot".to_string()]);
        assert_eq!(config.classifier.market_token, "market");
        assert_eq!(config.parser.weekdays.get("zaterdag"), Some(&Weekday::Sat));
        assert_eq!(config.parser.weekdays.len(), 1);
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file(Path::new("/nonexistent/market-hours.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.parser.weekdays, parsed.parser.weekdays);
    }
}
