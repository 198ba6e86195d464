//! Catalog items - the read-only records every component presents.

use serde::{Deserialize, Serialize};

/// Label shown on the hero when an item carries no category.
pub const FEATURED_LABEL: &str = "Featured";

/// Label shown in place of a missing rating.
pub const MISSING_RATING: &str = "–";

/// Stable identifier of a catalog item.
///
/// Unique within any list handed to the engine; it is the only key used for
/// loading state and carousel continuity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an identifier from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rating as supplied by the catalog feed: either a score or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    /// Numeric score, e.g. `8.4`.
    Score(f64),
    /// Preformatted label, e.g. `"8.4/10"`.
    Label(String),
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(score) => write!(f, "{score}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// Corner ribbon shown on a poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ribbon {
    /// Not yet released.
    Upcoming,
    /// Only available on this service.
    Exclusive,
}

impl Ribbon {
    /// Short text printed on the ribbon.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "SOON",
            Self::Exclusive => "EXCL",
        }
    }
}

/// A movie or show as delivered by the catalog feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Unique identifier.
    pub id: ItemId,
    /// Display title.
    pub title: String,
    /// Primary (portrait) poster URL.
    pub thumbnail: String,
    /// Optional wide image used by the hero banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_thumbnail: Option<String>,
    /// Category label, e.g. "Action".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Rating score or label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Quality tag, e.g. "4K".
    #[serde(default, alias = "quality", skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<String>,
    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Running time label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Not yet released.
    #[serde(default)]
    pub is_upcoming: bool,
    /// Exclusive to this service.
    #[serde(default)]
    pub is_exclusive: bool,
}

impl CatalogItem {
    /// Create an item with only the required fields set.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            thumbnail: thumbnail.into(),
            banner_thumbnail: None,
            category: None,
            rating: None,
            video_quality: None,
            year: None,
            duration: None,
            is_upcoming: false,
            is_exclusive: false,
        }
    }

    /// Set the wide banner image.
    #[must_use]
    pub fn with_banner(mut self, url: impl Into<String>) -> Self {
        self.banner_thumbnail = Some(url.into());
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the rating.
    #[must_use]
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Image shown by the hero banner: the wide image when there is one.
    #[must_use]
    pub fn hero_image(&self) -> &str {
        match self.banner_thumbnail.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => &self.thumbnail,
        }
    }

    /// Category as printed under a tile. Empty when there is none.
    #[must_use]
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some("Korean Drama") => "K-Drama",
            Some(category) => category,
            None => "",
        }
    }

    /// Category as printed on the hero, falling back to [`FEATURED_LABEL`].
    #[must_use]
    pub fn hero_category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(category) if !category.is_empty() => category,
            _ => FEATURED_LABEL,
        }
    }

    /// Rating text, or [`MISSING_RATING`].
    #[must_use]
    pub fn rating_label(&self) -> String {
        self.rating
            .as_ref()
            .map_or_else(|| MISSING_RATING.to_string(), ToString::to_string)
    }

    /// Ribbon to draw on the poster. Upcoming wins over exclusive.
    #[must_use]
    pub const fn ribbon(&self) -> Option<Ribbon> {
        if self.is_upcoming {
            Some(Ribbon::Upcoming)
        } else if self.is_exclusive {
            Some(Ribbon::Exclusive)
        } else {
            None
        }
    }
}

/// Parse a catalog list from JSON.
///
/// # Errors
///
/// Returns an error if the JSON is not an array of catalog items.
pub fn items_from_json(json: &str) -> Result<Vec<CatalogItem>, serde_json::Error> {
    serde_json::from_str(json)
}
