//! # Market Hours
//!
//! Decides from provider opening-hours text whether a place is a recurring
//! market, and materializes its upcoming occurrences.
//!
//! ## Architecture
//!
//! - **hours**: Text normalization, time and weekday-line parsing, durations
//! - **classify**: Market / store / excluded heuristics
//! - **materialize**: Weekly rules expanded over a look-ahead window
//! - **enrich**: Classification runs applied to the stores
//! - **ingest**: Provider records screened into places
//! - **storage**: Place and occurrence stores (memory, JSONL)
//! - **models**: Core data structures
//! - **config**: Configuration loading and validation

pub mod classify;
pub mod config;
pub mod enrich;
pub mod hours;
pub mod ingest;
pub mod materialize;
pub mod models;
pub mod storage;

pub use models::*;
