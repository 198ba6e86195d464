//! Story ring strip: badges and captions.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

/// Badge pinned under a story ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "lowercase")]
pub enum StoryBadge {
    /// Trending.
    Hot,
    /// Recently added.
    New,
    /// Top ranked.
    Top,
    /// Live now. The dot marker only shows for a label written exactly
    /// `LIVE`.
    Live {
        /// Whether the badge is prefixed with a dot.
        marker: bool,
    },
    /// Any other editor-supplied label, upper-cased.
    Custom(String),
}

impl StoryBadge {
    /// Parse an editor-supplied badge label. Blank labels produce no badge.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let upper = trimmed.to_uppercase();
        Some(match upper.as_str() {
            "HOT" => Self::Hot,
            "NEW" => Self::New,
            "TOP" => Self::Top,
            "LIVE" => Self::Live {
                marker: trimmed == "LIVE",
            },
            _ => Self::Custom(upper),
        })
    }

    /// Text printed on the badge.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Hot => "HOT".to_string(),
            Self::New => "NEW".to_string(),
            Self::Top => "TOP".to_string(),
            Self::Live { marker: true } => "● LIVE".to_string(),
            Self::Live { marker: false } => "LIVE".to_string(),
            Self::Custom(label) => label.clone(),
        }
    }
}

/// Caption under a story ring: the first word of the title.
#[must_use]
pub fn story_caption(item: &CatalogItem) -> &str {
    item.title.split_whitespace().next().unwrap_or("")
}

/// One ring in the story strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEntry {
    /// Item behind the ring.
    pub item: CatalogItem,
    /// Optional badge.
    pub badge: Option<StoryBadge>,
}

impl StoryEntry {
    /// Create an entry, parsing the optional badge label.
    #[must_use]
    pub fn new(item: CatalogItem, badge: Option<&str>) -> Self {
        Self {
            item,
            badge: badge.and_then(StoryBadge::parse),
        }
    }

    /// Caption under the ring.
    #[must_use]
    pub fn caption(&self) -> &str {
        story_caption(&self.item)
    }
}
