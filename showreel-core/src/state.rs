//! Browse screen state.
//!
//! Ties the poster grid, the hero carousel, the story and trending strips,
//! the tab bar and the live notice together. User actions are queued as
//! [`Intent`]s; the host drains them with [`BrowseState::take_intents`].

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Serialize;

use crate::carousel::{CarouselConfig, CarouselEngine, DotIndicator};
use crate::catalog::{items_from_json, CatalogItem, ItemId};
use crate::error::ShowreelResult;
use crate::event::{SwipeDirection, TouchEvent};
use crate::intent::{Intent, Tab, TabBar, TabEntry};
use crate::notice::{LiveConfigSync, NoticeConfig, NoticeDefaults, NoticeView};
use crate::source::DocumentSource;
use crate::story::{StoryBadge, StoryEntry};
use crate::tile::{LoadPhase, TileBoard, TileView};
use crate::trending::{trending_entries, TrendingEntry};

/// Hero banner as rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroView {
    /// Index of the shown item.
    pub index: usize,
    /// Shown item.
    pub item: CatalogItem,
    /// Wide image URL.
    pub image: String,
    /// Category chip text.
    pub category: String,
    /// Dots, when there is more than one item.
    pub indicator: Option<DotIndicator>,
}

/// One poster tile as rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileEntry {
    /// Catalog item.
    pub item: CatalogItem,
    /// Load phase of the poster.
    pub phase: LoadPhase,
    /// What to draw for that phase.
    pub view: TileView,
    /// Rating badge text.
    pub rating: String,
    /// Category text.
    pub category: String,
    /// Corner ribbon text, if any.
    pub ribbon: Option<&'static str>,
    /// Whether the item is on the user's list.
    pub favorite: bool,
}

/// One story ring as rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryView {
    /// Item behind the ring.
    pub item: CatalogItem,
    /// Caption under the ring.
    pub caption: String,
    /// Badge text, if any.
    pub badge: Option<String>,
}

/// Everything the browse screen draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseView {
    /// Hero banner, absent when nothing is featured.
    pub hero: Option<HeroView>,
    /// Story strip.
    pub stories: Vec<StoryView>,
    /// Trending row; empty when there is nothing to rank.
    pub trending: Vec<TrendingEntry>,
    /// Poster grid.
    pub tiles: Vec<TileEntry>,
    /// Notice banner, absent when disabled.
    pub notice: Option<NoticeView>,
    /// Bottom tab bar entries.
    pub tabs: Vec<TabEntry>,
}

/// The complete browse screen state.
#[derive(Debug)]
pub struct BrowseState {
    catalog: Vec<CatalogItem>,
    hero: CarouselEngine,
    stories: Vec<StoryEntry>,
    trending: Vec<CatalogItem>,
    tiles: TileBoard,
    favorites: HashSet<ItemId>,
    tab_bar: TabBar,
    notice: LiveConfigSync,
    notice_dirty: Rc<Cell<bool>>,
    outbox: Vec<Intent>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new(CarouselConfig::default(), NoticeDefaults::default())
    }
}

impl BrowseState {
    /// Create an empty screen.
    #[must_use]
    pub fn new(carousel: CarouselConfig, notice: NoticeDefaults) -> Self {
        Self {
            catalog: Vec::new(),
            hero: CarouselEngine::with_config(Vec::new(), carousel),
            stories: Vec::new(),
            trending: Vec::new(),
            tiles: TileBoard::new(),
            favorites: HashSet::new(),
            tab_bar: TabBar::new(Tab::Home),
            notice: LiveConfigSync::new(notice),
            notice_dirty: Rc::new(Cell::new(false)),
            outbox: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Host inputs
    // ---------------------------------------------------------------------

    /// Replace the poster grid items.
    pub fn set_catalog(&mut self, items: Vec<CatalogItem>) {
        self.tiles.sync_items(&items);
        self.catalog = items;
    }

    /// Replace the poster grid from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a list of catalog items; the
    /// current grid is left untouched.
    pub fn load_catalog_json(&mut self, json: &str) -> ShowreelResult<()> {
        let items = items_from_json(json)?;
        self.set_catalog(items);
        Ok(())
    }

    /// Replace the featured items shown in the hero.
    pub fn set_featured(&mut self, items: Vec<CatalogItem>) {
        self.hero.set_items(items);
    }

    /// Replace the story strip.
    pub fn set_stories(&mut self, stories: Vec<StoryEntry>) {
        self.stories = stories;
    }

    /// Replace the ranked trending list. Only the head of it is shown.
    pub fn set_trending(&mut self, items: Vec<CatalogItem>) {
        self.trending = items;
    }

    /// Replace the set of favorited items.
    pub fn set_favorites(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        self.favorites = ids.into_iter().collect();
    }

    /// Record the tab the host is showing.
    pub fn set_active_tab(&mut self, tab: Tab) {
        self.tab_bar.active = tab;
    }

    /// Show or hide the tab bar.
    pub fn set_tab_bar_visible(&mut self, visible: bool) {
        self.tab_bar.visible = visible;
    }

    /// Deliver a poster decode outcome. Returns whether a tile changed.
    pub fn resolve_image(&mut self, id: &ItemId, source: &str, success: bool) -> bool {
        self.tiles.resolve(id, source, success)
    }

    /// Subscribe the notice banner to a remote document.
    ///
    /// Returns whether the subscription was established; failures leave
    /// the defaults in place.
    pub fn start_notice<S>(&mut self, source: &S, path: &str) -> bool
    where
        S: DocumentSource + ?Sized,
    {
        let dirty = Rc::clone(&self.notice_dirty);
        self.notice.start(source, path, move |_| dirty.set(true))
    }

    /// Set or clear the host's request link override.
    pub fn set_notice_link(&mut self, link: Option<&str>) {
        self.notice.set_action_override(link);
    }

    /// Release the notice subscription.
    pub fn stop_notice(&mut self) {
        self.notice.stop();
    }

    /// Whether the notice changed since the last call.
    pub fn take_notice_changed(&mut self) -> bool {
        self.notice_dirty.replace(false)
    }

    // ---------------------------------------------------------------------
    // Hero carousel
    // ---------------------------------------------------------------------

    /// Hero carousel engine.
    #[must_use]
    pub const fn hero(&self) -> &CarouselEngine {
        &self.hero
    }

    /// Route a touch event to the hero banner.
    pub fn hero_touch(&mut self, event: &TouchEvent) -> Option<SwipeDirection> {
        self.hero.handle_touch(event)
    }

    /// A dot under the hero was pressed.
    pub fn hero_select(&mut self, index: i64) -> bool {
        self.hero.select_index(index)
    }

    /// Autoplay step. Returns whether the hero moved.
    pub fn hero_tick(&mut self) -> bool {
        self.hero.tick()
    }

    /// Play button on the hero.
    pub fn hero_play(&mut self) {
        if let Some(intent) = self.hero.play() {
            self.outbox.push(intent);
        }
    }

    /// Info button on the hero.
    pub fn hero_open(&mut self) {
        if let Some(intent) = self.hero.open() {
            self.outbox.push(intent);
        }
    }

    // ---------------------------------------------------------------------
    // Grid and tabs
    // ---------------------------------------------------------------------

    /// Poster load states.
    #[must_use]
    pub const fn tiles(&self) -> &TileBoard {
        &self.tiles
    }

    /// A poster was clicked. Unknown ids are ignored.
    pub fn open(&mut self, id: &ItemId) -> bool {
        self.emit_for(id, Intent::Open)
    }

    /// Play was requested for an item. Unknown ids are ignored.
    pub fn play(&mut self, id: &ItemId) -> bool {
        self.emit_for(id, Intent::Play)
    }

    /// Flip the favorite flag locally and ask the host to persist it.
    pub fn toggle_favorite(&mut self, id: &ItemId) -> bool {
        if !self.emit_for(id, Intent::ToggleFavorite) {
            return false;
        }
        if !self.favorites.remove(id) {
            self.favorites.insert(id.clone());
        }
        true
    }

    /// Whether an item is on the user's list.
    #[must_use]
    pub fn is_favorite(&self, id: &ItemId) -> bool {
        self.favorites.contains(id)
    }

    /// A tab was pressed.
    pub fn select_tab(&mut self, tab: Tab) {
        let intent = self.tab_bar.select(tab);
        self.outbox.push(intent);
    }

    /// Current tab bar.
    #[must_use]
    pub const fn tab_bar(&self) -> &TabBar {
        &self.tab_bar
    }

    // ---------------------------------------------------------------------
    // Notice
    // ---------------------------------------------------------------------

    /// Resolved notice config.
    #[must_use]
    pub fn notice(&self) -> NoticeConfig {
        self.notice.config()
    }

    /// The notice request button was pressed. Ignored while hidden.
    pub fn request_notice(&mut self) -> bool {
        match self.notice.view() {
            Some(view) => {
                self.outbox.push(view.request());
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    /// Drain queued intents in the order they were produced.
    pub fn take_intents(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.outbox)
    }

    /// Build the full render view.
    #[must_use]
    pub fn view(&self) -> BrowseView {
        let hero = self.hero.current().and_then(|item| {
            self.hero.current_index().map(|index| HeroView {
                index,
                item: item.clone(),
                image: item.hero_image().to_string(),
                category: item.hero_category_label().to_string(),
                indicator: self.hero.indicator(),
            })
        });

        let tiles = self
            .catalog
            .iter()
            .filter_map(|item| {
                let tile = self.tiles.get(&item.id)?;
                Some(TileEntry {
                    item: item.clone(),
                    phase: tile.phase(),
                    view: tile.view(),
                    rating: item.rating_label(),
                    category: item.category_label().to_string(),
                    ribbon: item.ribbon().map(|r| r.label()),
                    favorite: self.favorites.contains(&item.id),
                })
            })
            .collect();

        let stories = self
            .stories
            .iter()
            .map(|story| StoryView {
                item: story.item.clone(),
                caption: story.caption().to_string(),
                badge: story.badge.as_ref().map(StoryBadge::text),
            })
            .collect();

        BrowseView {
            hero,
            stories,
            trending: trending_entries(&self.trending),
            tiles,
            notice: self.notice.view(),
            tabs: self.tab_bar.entries(),
        }
    }

    fn emit_for(&mut self, id: &ItemId, make: fn(ItemId) -> Intent) -> bool {
        let known = self
            .catalog
            .iter()
            .chain(self.hero.items())
            .chain(self.stories.iter().map(|story| &story.item))
            .chain(&self.trending)
            .any(|i| &i.id == id);
        if !known {
            tracing::debug!(%id, "ignoring action on unknown item");
            return false;
        }
        self.outbox.push(make(id.clone()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{DEFAULT_ACTION_LINK, NOTICE_DOCUMENT_PATH};
    use crate::source::MemoryDocumentSource;
    use serde_json::json;

    fn item(id: &str) -> CatalogItem {
        CatalogItem::new(id, format!("Title {id}"), format!("{id}.jpg"))
    }

    fn screen() -> BrowseState {
        let mut state = BrowseState::default();
        state.set_catalog(vec![item("a"), item("b"), item("c")]);
        state.set_featured(vec![item("a"), item("b")]);
        state
    }

    #[test]
    fn test_catalog_creates_pending_tiles() {
        let state = screen();
        assert_eq!(state.tiles().len(), 3);
        assert_eq!(state.tiles().count(LoadPhase::Pending), 3);
    }

    #[test]
    fn test_resolve_image_updates_view() {
        let mut state = screen();
        assert!(state.resolve_image(&ItemId::new("a"), "a.jpg", true));
        assert!(state.resolve_image(&ItemId::new("b"), "b.jpg", false));
        assert!(!state.resolve_image(&ItemId::new("a"), "a.jpg", false));

        let view = state.view();
        assert_eq!(view.tiles[0].phase, LoadPhase::Loaded);
        assert_eq!(view.tiles[1].phase, LoadPhase::Failed);
        assert!(view.tiles[1].view.placeholder);
        assert!(view.tiles[2].view.shimmer);
    }

    #[test]
    fn test_intents_queue_in_order() {
        let mut state = screen();
        assert!(state.open(&ItemId::new("a")));
        assert!(state.play(&ItemId::new("c")));
        state.hero_play();
        state.select_tab(Tab::Search);
        assert!(!state.open(&ItemId::new("zzz")));

        assert_eq!(
            state.take_intents(),
            vec![
                Intent::Open(ItemId::new("a")),
                Intent::Play(ItemId::new("c")),
                Intent::Play(ItemId::new("a")),
                Intent::ChangeTab(Tab::Search),
            ]
        );
        assert!(state.take_intents().is_empty());
    }

    #[test]
    fn test_toggle_favorite() {
        let mut state = screen();
        let id = ItemId::new("b");
        assert!(state.toggle_favorite(&id));
        assert!(state.is_favorite(&id));
        assert!(state.toggle_favorite(&id));
        assert!(!state.is_favorite(&id));
        assert_eq!(state.take_intents().len(), 2);
    }

    #[test]
    fn test_hero_navigation_and_view() {
        let mut state = screen();
        assert!(state.hero_select(1));
        state.hero_open();
        let view = state.view();
        let hero = view.hero.expect("hero");
        assert_eq!(hero.index, 1);
        assert_eq!(hero.indicator, Some(DotIndicator { count: 2, active: 1 }));
        assert_eq!(state.take_intents(), vec![Intent::Open(ItemId::new("b"))]);
    }

    #[test]
    fn test_empty_hero() {
        let mut state = BrowseState::default();
        state.hero_play();
        assert!(state.view().hero.is_none());
        assert!(state.take_intents().is_empty());
    }

    #[test]
    fn test_notice_request_and_remote_updates() {
        let source = MemoryDocumentSource::new();
        let mut state = screen();
        assert!(state.start_notice(&source, NOTICE_DOCUMENT_PATH));
        assert!(!state.take_notice_changed());

        let mut data = serde_json::Map::new();
        data.insert("text".into(), json!("Live now"));
        source.set(NOTICE_DOCUMENT_PATH, data);
        assert!(state.take_notice_changed());
        assert_eq!(state.notice().text, "Live now");

        assert!(state.request_notice());
        assert_eq!(
            state.take_intents(),
            vec![Intent::OpenLink(DEFAULT_ACTION_LINK.to_string())]
        );

        let mut off = serde_json::Map::new();
        off.insert("enabled".into(), json!(false));
        source.merge(NOTICE_DOCUMENT_PATH, off);
        assert!(!state.request_notice());
        assert!(state.view().notice.is_none());
    }

    #[test]
    fn test_notice_link_override() {
        let mut state = screen();
        state.set_notice_link(Some("https://host.example/ask"));
        state.request_notice();
        assert_eq!(
            state.take_intents(),
            vec![Intent::OpenLink("https://host.example/ask".to_string())]
        );
    }

    #[test]
    fn test_drop_releases_notice_subscription() {
        let source = MemoryDocumentSource::new();
        {
            let mut state = screen();
            state.start_notice(&source, NOTICE_DOCUMENT_PATH);
            assert_eq!(source.listener_count(NOTICE_DOCUMENT_PATH), 1);
        }
        assert_eq!(source.listener_count(NOTICE_DOCUMENT_PATH), 0);
    }

    #[test]
    fn test_load_catalog_json() {
        let mut state = screen();
        assert!(state.load_catalog_json("not json").is_err());
        assert_eq!(state.tiles().len(), 3);

        state
            .load_catalog_json(r#"[{"id": "z", "title": "Zed", "thumbnail": "z.jpg"}]"#)
            .expect("valid catalog");
        assert_eq!(state.tiles().len(), 1);
    }

    #[test]
    fn test_hidden_tab_bar() {
        let mut state = screen();
        state.set_active_tab(Tab::Favorites);
        assert_eq!(state.tab_bar().active, Tab::Favorites);
        state.set_tab_bar_visible(false);
        assert!(state.view().tabs.is_empty());
    }

    #[test]
    fn test_story_strip_in_view() {
        let mut state = screen();
        state.set_stories(vec![
            StoryEntry::new(CatalogItem::new("s1", "Dune Part Two", "d.jpg"), Some("LIVE")),
            StoryEntry::new(CatalogItem::new("s2", "Heat", "h.jpg"), None),
        ]);

        let view = state.view();
        assert_eq!(view.stories.len(), 2);
        assert_eq!(view.stories[0].caption, "Dune");
        assert_eq!(view.stories[0].badge.as_deref(), Some("● LIVE"));
        assert_eq!(view.stories[1].badge, None);

        assert!(state.open(&ItemId::new("s1")));
        assert_eq!(state.take_intents(), vec![Intent::Open(ItemId::new("s1"))]);
    }

    #[test]
    fn test_trending_row_in_view() {
        let mut state = screen();
        assert!(state.view().trending.is_empty());

        state.set_trending((0..12).map(|i| item(&format!("t{i}"))).collect());
        let view = state.view();
        assert_eq!(view.trending.len(), crate::trending::TRENDING_LIMIT);
        assert_eq!(view.trending[0].rank, 1);
        assert!(view.trending[0].is_top);
        assert!(!view.trending[1].is_top);

        assert!(state.play(&ItemId::new("t3")));
        assert_eq!(state.take_intents(), vec![Intent::Play(ItemId::new("t3"))]);
    }
}
