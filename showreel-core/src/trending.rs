//! Trending row: the head of a ranked list with big rank numbers.

use serde::Serialize;

use crate::catalog::CatalogItem;

/// Most entries the row shows.
pub const TRENDING_LIMIT: usize = 10;

/// One ranked poster in the trending row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Ranked item.
    pub item: CatalogItem,
    /// The first entry gets the highlighted frame and crown.
    pub is_top: bool,
}

impl TrendingEntry {
    /// Poster image URL.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.item.thumbnail
    }
}

/// Rank the first [`TRENDING_LIMIT`] items in order.
///
/// An empty list yields an empty row, which is not drawn.
#[must_use]
pub fn trending_entries(items: &[CatalogItem]) -> Vec<TrendingEntry> {
    items
        .iter()
        .take(TRENDING_LIMIT)
        .enumerate()
        .map(|(index, item)| TrendingEntry {
            rank: index + 1,
            item: item.clone(),
            is_top: index == 0,
        })
        .collect()
}
