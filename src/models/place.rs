//! Place record held by the place store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, PlaceId};

/// A point of interest that may be a recurring market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier (derived from source + source id)
    pub id: PlaceId,

    /// Display name
    pub name: String,

    /// URL-friendly name
    pub slug: String,

    /// Provider category tags (e.g. "point_of_interest", "restaurant")
    #[serde(default)]
    pub categories: Vec<String>,

    /// Provider weekday lines, e.g. "Saturday: 8:00 AM – 1:00 PM"
    #[serde(default)]
    pub opening_hours_text: Vec<String>,

    /// Written only by classification
    pub is_market: bool,

    /// Provider name (e.g. "google", "osm")
    pub source: String,

    /// Provider's identifier for this place
    pub source_id: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// Create a new Place with an ID derived from its provider identity.
    pub fn new(name: String, source: String, source_id: String) -> Self {
        let id = Self::id_for(&source, &source_id);
        let slug = slugify(&name);
        let now = Utc::now();

        Self {
            id,
            name,
            slug,
            categories: Vec::new(),
            opening_hours_text: Vec::new(),
            is_market: false,
            source,
            source_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// ID a provider record maps to.
    pub fn id_for(source: &str, source_id: &str) -> PlaceId {
        EntityId::generate(&[source, source_id])
    }

    /// Builder method to set category tags.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Builder method to set raw hours lines.
    pub fn with_opening_hours(mut self, lines: Vec<String>) -> Self {
        self.opening_hours_text = lines;
        self
    }

    /// Builder method to set the market flag.
    pub fn with_market_flag(mut self, is_market: bool) -> Self {
        self.is_market = is_market;
        self
    }

    pub fn has_hours(&self) -> bool {
        self.opening_hours_text.iter().any(|l| !l.trim().is_empty())
    }
}

/// Lowercase, collapse every non-alphanumeric run to `-`, trim dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
