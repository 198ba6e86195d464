//! # Poster Loading State
//!
//! Every rendered poster tracks its own image load independently.
//!
//! ```text
//!            success
//!   Pending ─────────▶ Loaded
//!      │
//!      └─────────────▶ Failed   (terminal, placeholder glyph)
//!            error
//! ```
//!
//! Loaded and Failed are terminal for a given image URL. Only a new URL
//! (a new identity) brings the tile back to Pending. There is no timeout:
//! a tile that never hears back stays Pending.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogItem, ItemId};

/// Load phase of a single poster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    /// Waiting for the decode signal.
    #[default]
    Pending,
    /// Image decoded and visible.
    Loaded,
    /// Image failed; a placeholder glyph is shown and no retry happens.
    Failed,
}

impl LoadPhase {
    /// Whether no further transitions can happen for the current image.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

/// What the tile should draw for its current phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileView {
    /// Shimmering skeleton over the poster area.
    pub shimmer: bool,
    /// Whether the image element stays in the layout.
    pub image_mounted: bool,
    /// Opacity of the image element (0.0 hidden, 1.0 shown).
    pub image_opacity: f32,
    /// Generic glyph replacing the image.
    pub placeholder: bool,
}

/// Load state of one poster instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLoadState {
    source: String,
    phase: LoadPhase,
}

impl TileLoadState {
    /// Start tracking the image at `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            phase: LoadPhase::Pending,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// URL of the image currently tracked.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Record the decode outcome of the current image.
    ///
    /// Ignored once the tile is terminal. Returns whether the phase changed.
    pub fn on_image_resolved(&mut self, success: bool) -> bool {
        if self.phase.is_terminal() {
            tracing::trace!(source = %self.source, "ignoring repeated resolution");
            return false;
        }
        self.phase = if success {
            LoadPhase::Loaded
        } else {
            tracing::debug!(source = %self.source, "poster failed to load, showing placeholder");
            LoadPhase::Failed
        };
        true
    }

    /// Record a decode outcome for a specific image URL.
    ///
    /// A URL different from the tracked one restarts the cycle for that new
    /// identity before applying the outcome.
    pub fn resolve_for(&mut self, source: &str, success: bool) -> bool {
        if self.source != source {
            self.set_source(source);
        }
        self.on_image_resolved(success)
    }

    /// Point the tile at a new image. Same URL is a no-op.
    ///
    /// Returns whether the state was reset.
    pub fn set_source(&mut self, source: &str) -> bool {
        if self.source == source {
            return false;
        }
        self.source = source.to_string();
        self.phase = LoadPhase::Pending;
        true
    }

    /// Render contract for the current phase.
    #[must_use]
    pub const fn view(&self) -> TileView {
        match self.phase {
            LoadPhase::Pending => TileView {
                shimmer: true,
                image_mounted: true,
                image_opacity: 0.0,
                placeholder: false,
            },
            LoadPhase::Loaded => TileView {
                shimmer: false,
                image_mounted: true,
                image_opacity: 1.0,
                placeholder: false,
            },
            LoadPhase::Failed => TileView {
                shimmer: false,
                image_mounted: false,
                image_opacity: 0.0,
                placeholder: true,
            },
        }
    }
}

/// Load states for every poster in a grid, keyed by catalog identifier.
#[derive(Debug, Clone, Default)]
pub struct TileBoard {
    tiles: HashMap<ItemId, TileLoadState>,
}

impl TileBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Align the board with the items currently rendered.
    ///
    /// New items start Pending, items whose poster URL changed restart, and
    /// items no longer present are discarded.
    pub fn sync_items(&mut self, items: &[CatalogItem]) {
        let before = self.tiles.len();
        self.tiles.retain(|id, _| items.iter().any(|item| &item.id == id));
        let dropped = before - self.tiles.len();

        for item in items {
            self.tiles
                .entry(item.id.clone())
                .and_modify(|tile| {
                    tile.set_source(&item.thumbnail);
                })
                .or_insert_with(|| TileLoadState::new(item.thumbnail.clone()));
        }

        tracing::debug!(tiles = self.tiles.len(), dropped, "tile board synced");
    }

    /// Deliver an image decode outcome.
    ///
    /// Completions for tiles that are gone, or for an image URL the tile no
    /// longer shows, are stale and ignored. Returns whether anything changed.
    pub fn resolve(&mut self, id: &ItemId, source: &str, success: bool) -> bool {
        let Some(tile) = self.tiles.get_mut(id) else {
            tracing::debug!(%id, "stale load for removed tile");
            return false;
        };
        if tile.source() != source {
            tracing::debug!(%id, source, "stale load for previous poster");
            return false;
        }
        tile.on_image_resolved(success)
    }

    /// Load state of a tile.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&TileLoadState> {
        self.tiles.get(id)
    }

    /// Phase of a tile, if it is tracked.
    #[must_use]
    pub fn phase(&self, id: &ItemId) -> Option<LoadPhase> {
        self.tiles.get(id).map(TileLoadState::phase)
    }

    /// Number of tracked tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Check if no tiles are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Count tiles in a given phase.
    #[must_use]
    pub fn count(&self, phase: LoadPhase) -> usize {
        self.tiles.values().filter(|t| t.phase() == phase).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_is_pending() {
        let tile = TileLoadState::new("a.jpg");
        assert_eq!(tile.phase(), LoadPhase::Pending);
        assert_eq!(tile.source(), "a.jpg");
    }

    #[test]
    fn test_success_loads() {
        let mut tile = TileLoadState::new("a.jpg");
        assert!(tile.on_image_resolved(true));
        assert_eq!(tile.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut tile = TileLoadState::new("broken.jpg");
        assert!(tile.on_image_resolved(false));
        assert_eq!(tile.phase(), LoadPhase::Failed);

        assert!(!tile.on_image_resolved(true));
        assert!(!tile.on_image_resolved(false));
        assert!(!tile.resolve_for("broken.jpg", true));
        assert_eq!(tile.phase(), LoadPhase::Failed);
    }

    #[test]
    fn test_loaded_is_terminal() {
        let mut tile = TileLoadState::new("a.jpg");
        tile.on_image_resolved(true);
        assert!(!tile.on_image_resolved(false));
        assert_eq!(tile.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_new_source_restarts_cycle() {
        let mut tile = TileLoadState::new("broken.jpg");
        tile.on_image_resolved(false);

        assert!(tile.set_source("fixed.jpg"));
        assert_eq!(tile.phase(), LoadPhase::Pending);
        assert!(tile.on_image_resolved(true));
        assert_eq!(tile.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_same_source_does_not_reset() {
        let mut tile = TileLoadState::new("a.jpg");
        tile.on_image_resolved(true);
        assert!(!tile.set_source("a.jpg"));
        assert_eq!(tile.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_resolve_for_new_identity() {
        let mut tile = TileLoadState::new("old.jpg");
        tile.on_image_resolved(false);

        assert!(tile.resolve_for("new.jpg", true));
        assert_eq!(tile.source(), "new.jpg");
        assert_eq!(tile.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_views_per_phase() {
        let mut tile = TileLoadState::new("a.jpg");
        let pending = tile.view();
        assert!(pending.shimmer);
        assert!(pending.image_mounted);
        assert!(pending.image_opacity.abs() < f32::EPSILON);
        assert!(!pending.placeholder);

        tile.on_image_resolved(true);
        let loaded = tile.view();
        assert!(!loaded.shimmer);
        assert!(loaded.image_mounted);
        assert!((loaded.image_opacity - 1.0).abs() < f32::EPSILON);

        let mut broken = TileLoadState::new("b.jpg");
        broken.on_image_resolved(false);
        let failed = broken.view();
        assert!(failed.placeholder);
        assert!(!failed.image_mounted);
        assert!(!failed.shimmer);
    }

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("a", "Alpha", "a.jpg"),
            CatalogItem::new("b", "Beta", "b.jpg"),
            CatalogItem::new("c", "Gamma", "c.jpg"),
        ]
    }

    #[test]
    fn test_board_tracks_each_item_independently() {
        let mut board = TileBoard::new();
        board.sync_items(&items());
        assert_eq!(board.len(), 3);
        assert_eq!(board.count(LoadPhase::Pending), 3);

        assert!(board.resolve(&"a".into(), "a.jpg", true));
        assert!(board.resolve(&"b".into(), "b.jpg", false));

        assert_eq!(board.phase(&"a".into()), Some(LoadPhase::Loaded));
        assert_eq!(board.phase(&"b".into()), Some(LoadPhase::Failed));
        assert_eq!(board.phase(&"c".into()), Some(LoadPhase::Pending));
    }

    #[test]
    fn test_board_drops_removed_items() {
        let mut board = TileBoard::new();
        board.sync_items(&items());
        board.sync_items(&items()[..1]);

        assert_eq!(board.len(), 1);
        assert!(board.get(&"b".into()).is_none());
    }

    #[test]
    fn test_board_ignores_stale_loads() {
        let mut board = TileBoard::new();
        board.sync_items(&items());
        board.sync_items(&items()[1..]);

        // Tile "a" is gone.
        assert!(!board.resolve(&"a".into(), "a.jpg", true));
        assert!(board.get(&"a".into()).is_none());

        // Completion for an image the tile no longer shows.
        let mut changed = items();
        changed[1].thumbnail = "b2.jpg".to_string();
        board.sync_items(&changed);
        assert!(!board.resolve(&"b".into(), "b.jpg", true));
        assert_eq!(board.phase(&"b".into()), Some(LoadPhase::Pending));
    }

    #[test]
    fn test_board_resync_keeps_terminal_state_for_same_url() {
        let mut board = TileBoard::new();
        board.sync_items(&items());
        board.resolve(&"c".into(), "c.jpg", false);

        board.sync_items(&items());
        assert_eq!(board.phase(&"c".into()), Some(LoadPhase::Failed));
    }

    #[test]
    fn test_board_poster_change_restarts() {
        let mut board = TileBoard::new();
        board.sync_items(&items());
        board.resolve(&"c".into(), "c.jpg", false);

        let mut changed = items();
        changed[2].thumbnail = "c-retry.jpg".to_string();
        board.sync_items(&changed);
        assert_eq!(board.phase(&"c".into()), Some(LoadPhase::Pending));
        assert!(board.resolve(&"c".into(), "c-retry.jpg", true));
        assert_eq!(board.phase(&"c".into()), Some(LoadPhase::Loaded));
    }
}
