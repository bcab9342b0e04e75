//! Core data models for market classification.

mod day_rule;
mod ids;
mod occurrence;
mod place;
mod time;
mod verdict;

pub use day_rule::*;
pub use ids::*;
pub use occurrence::*;
pub use place::*;
pub use time::*;
pub use verdict::*;
