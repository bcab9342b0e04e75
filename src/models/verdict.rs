//! Three-way classification outcome for a place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a place is a recurring market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Recurring market: occurrences are generated.
    Market,
    /// Named like a market but behaves like a store: occurrences are purged.
    Store,
    /// Not a market candidate at all: nothing is touched.
    Excluded,
}

impl Verdict {
    pub fn is_market(&self) -> bool {
        matches!(self, Verdict::Market)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Market => "market",
            Verdict::Store => "store",
            Verdict::Excluded => "excluded",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
