use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_hours::config::AppConfig;
use market_hours::enrich::{Engine, Enricher, PlaceHours};
use market_hours::ingest::{load_provider_file, Ingestor};
use market_hours::materialize::DayRestriction;
use market_hours::models::EntityId;
use market_hours::storage::{EventStore, JsonlEventStore, JsonlPlaceStore, StorageConfig};

#[derive(Parser)]
#[command(name = "market-hours")]
#[command(about = "Recurring market classification and occurrence generation")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./market-hours.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen provider places into the place store
    Ingest {
        /// JSON array of provider places
        #[arg(long)]
        file: PathBuf,

        /// Provider name (default from config)
        #[arg(long)]
        provider: Option<String>,

        /// Reference time for store purges (YYYY-MM-DDTHH:MM, local)
        #[arg(long)]
        now: Option<String>,
    },

    /// Classify stored markets and regenerate their occurrences
    Enrich {
        /// Look-ahead window in days (clamped to 7-60)
        #[arg(long)]
        window_days: Option<u32>,

        /// Generate every weekday, not only weekends
        #[arg(long)]
        all_days: bool,

        /// Max places to process
        #[arg(long)]
        limit: Option<usize>,

        /// Classify and count without writing
        #[arg(long)]
        dry_run: bool,

        /// Reference time (YYYY-MM-DDTHH:MM, local); defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Classify ad-hoc input and print signals, verdict and occurrences
    Classify {
        /// Place name
        #[arg(long)]
        name: String,

        /// Category tag (repeatable)
        #[arg(long)]
        category: Vec<String>,

        /// Hours line, e.g. "Saturday: 8am-1pm" (repeatable)
        #[arg(long)]
        hours: Vec<String>,

        /// Look-ahead window in days (default from config)
        #[arg(long)]
        window_days: Option<u32>,

        /// Generate every weekday, not only weekends
        #[arg(long)]
        all_days: bool,

        #[arg(long)]
        now: Option<String>,
    },

    /// List stored occurrences for a place
    Occurrences {
        /// Place ID
        #[arg(long)]
        place: String,

        /// Days ahead to list
        #[arg(long, default_value = "60")]
        days: u32,

        #[arg(long)]
        now: Option<String>,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        AppConfig::default()
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn parse_now(now: Option<&str>) -> Result<NaiveDateTime> {
    match now {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .with_context(|| format!("Invalid --now (expected YYYY-MM-DDTHH:MM): {}", s)),
        None => Ok(Local::now().naive_local()),
    }
}

fn restriction(all_days: bool, weekend_only: bool) -> DayRestriction {
    if all_days || !weekend_only {
        DayRestriction::Any
    } else {
        DayRestriction::WeekendOnly
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting market-hours v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Ingest {
            file,
            provider,
            now,
        } => {
            let now = parse_now(now.as_deref())?;
            let records = load_provider_file(&file)?;
            let mut places = JsonlPlaceStore::new(&storage);
            let mut events = JsonlEventStore::new(&storage);
            let result = Ingestor::from_config(&config, provider.as_deref())
                .ingest(&mut places, &mut events, &records, now)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Enrich {
            window_days,
            all_days,
            limit,
            dry_run,
            now,
        } => {
            let now = parse_now(now.as_deref())?;
            let mut config = config;
            if let Some(days) = window_days {
                config.enrich.window_days = days;
            }
            if let Some(limit) = limit {
                config.enrich.limit = limit;
            }
            if all_days {
                config.enrich.weekend_only = false;
            }
            let config = config.clamped();

            let mut places = JsonlPlaceStore::new(&storage);
            let mut events = JsonlEventStore::new(&storage);
            let summary = Enricher::from_config(&config)
                .with_dry_run(dry_run)
                .run(&mut places, &mut events, now)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Classify {
            name,
            category,
            hours,
            window_days,
            all_days,
            now,
        } => {
            let now = parse_now(now.as_deref())?;
            let place_id = EntityId::from("adhoc");
            let engine = Engine::from_config(&config);
            let outcome = engine.classify_and_materialize(
                PlaceHours {
                    place_id: &place_id,
                    name: &name,
                    categories: &category,
                    lines: &hours,
                },
                now,
                window_days.unwrap_or(config.enrich.window_days),
                &restriction(all_days, config.enrich.weekend_only),
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Occurrences { place, days, now } => {
            let now = parse_now(now.as_deref())?;
            let events = JsonlEventStore::new(&storage);
            let found = events.query(
                &EntityId::from(place),
                now,
                now + Duration::days(i64::from(days)),
            )?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
    }

    Ok(())
}
