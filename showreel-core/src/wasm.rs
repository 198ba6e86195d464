//! WebAssembly bindings for showreel-core.
//!
//! Exposes the browse screen to JavaScript hosts. Structured values cross
//! the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::notice::NOTICE_DOCUMENT_PATH;
use crate::{
    BrowseState, CarouselConfig, CatalogItem, ItemId, MemoryDocumentSource, NoticeDefaults,
    StoryEntry, Tab, TouchEvent,
};

/// Initialize the showreel WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Browse screen instance for WASM.
///
/// Remote notice documents are pushed in by the host's transport through
/// [`WasmShowreel::push_notice_document`].
#[wasm_bindgen]
pub struct WasmShowreel {
    state: BrowseState,
    source: MemoryDocumentSource,
}

#[wasm_bindgen]
impl WasmShowreel {
    /// Create a screen with default settings.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BrowseState::default(),
            source: MemoryDocumentSource::new(),
        }
    }

    /// Create a screen with carousel and notice settings as JSON.
    ///
    /// Expects `{"carousel": {...}, "notice": {...}}`; both keys optional.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<WasmShowreel, String> {
        #[derive(serde::Deserialize, Default)]
        #[serde(default)]
        struct Settings {
            carousel: CarouselConfig,
            notice: NoticeDefaults,
        }
        let settings: Settings = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(Self {
            state: BrowseState::new(settings.carousel, settings.notice),
            source: MemoryDocumentSource::new(),
        })
    }

    /// Replace the poster grid from a JSON array of items.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = setCatalogJson)]
    pub fn set_catalog_json(&mut self, json: &str) -> Result<(), String> {
        self.state.load_catalog_json(json).map_err(|e| e.to_string())
    }

    /// Replace the hero items from a JSON array of items.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = setFeaturedJson)]
    pub fn set_featured_json(&mut self, json: &str) -> Result<(), String> {
        let items = crate::items_from_json(json).map_err(|e| e.to_string())?;
        self.state.set_featured(items);
        Ok(())
    }

    /// Replace the story strip from a JSON array of
    /// `{"item": {...}, "badge": "hot"}` entries; `badge` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = setStoriesJson)]
    pub fn set_stories_json(&mut self, json: &str) -> Result<(), String> {
        #[derive(serde::Deserialize)]
        struct Story {
            item: CatalogItem,
            #[serde(default)]
            badge: Option<String>,
        }
        let stories: Vec<Story> = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.state.set_stories(
            stories
                .into_iter()
                .map(|story| StoryEntry::new(story.item, story.badge.as_deref()))
                .collect(),
        );
        Ok(())
    }

    /// Replace the ranked trending list from a JSON array of items.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = setTrendingJson)]
    pub fn set_trending_json(&mut self, json: &str) -> Result<(), String> {
        let items = crate::items_from_json(json).map_err(|e| e.to_string())?;
        self.state.set_trending(items);
        Ok(())
    }

    /// Replace the favorite set from a JSON array of ids.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = setFavoritesJson)]
    pub fn set_favorites_json(&mut self, json: &str) -> Result<(), String> {
        let ids: Vec<ItemId> = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.state.set_favorites(ids);
        Ok(())
    }

    /// Report a poster decode outcome.
    #[wasm_bindgen(js_name = resolveImage)]
    pub fn resolve_image(&mut self, id: &str, source: &str, success: bool) -> bool {
        self.state.resolve_image(&ItemId::new(id), source, success)
    }

    /// Route a touch event (JSON) to the hero banner.
    ///
    /// Returns the navigation step taken: `1`, `-1` or `0`.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = handleHeroTouch)]
    pub fn handle_hero_touch(&mut self, json: &str) -> Result<i32, String> {
        let event: TouchEvent = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(match self.state.hero_touch(&event) {
            Some(direction) if direction.delta() > 0 => 1,
            Some(_) => -1,
            None => 0,
        })
    }

    /// Jump the hero to a dot.
    #[wasm_bindgen(js_name = selectHero)]
    pub fn select_hero(&mut self, index: i32) -> bool {
        self.state.hero_select(i64::from(index))
    }

    /// Autoplay step.
    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self) -> bool {
        self.state.hero_tick()
    }

    /// Play button on the hero.
    #[wasm_bindgen(js_name = heroPlay)]
    pub fn hero_play(&mut self) {
        self.state.hero_play();
    }

    /// Info button on the hero.
    #[wasm_bindgen(js_name = heroOpen)]
    pub fn hero_open(&mut self) {
        self.state.hero_open();
    }

    /// A poster was clicked.
    #[wasm_bindgen(js_name = openItem)]
    pub fn open_item(&mut self, id: &str) -> bool {
        self.state.open(&ItemId::new(id))
    }

    /// Play an item.
    #[wasm_bindgen(js_name = playItem)]
    pub fn play_item(&mut self, id: &str) -> bool {
        self.state.play(&ItemId::new(id))
    }

    /// Flip an item's favorite flag.
    #[wasm_bindgen(js_name = toggleFavorite)]
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        self.state.toggle_favorite(&ItemId::new(id))
    }

    /// A tab was pressed (`home`, `search` or `favorites`).
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown tab name.
    #[wasm_bindgen(js_name = selectTab)]
    pub fn select_tab(&mut self, tab: &str) -> Result<(), String> {
        let tab: Tab = serde_json::from_value(serde_json::Value::String(tab.to_string()))
            .map_err(|e| e.to_string())?;
        self.state.select_tab(tab);
        Ok(())
    }

    /// Show or hide the tab bar.
    #[wasm_bindgen(js_name = setTabBarVisible)]
    pub fn set_tab_bar_visible(&mut self, visible: bool) {
        self.state.set_tab_bar_visible(visible);
    }

    /// Subscribe the notice to documents pushed by the host.
    #[wasm_bindgen(js_name = startNotice)]
    pub fn start_notice(&mut self) -> bool {
        self.state.start_notice(&self.source, NOTICE_DOCUMENT_PATH)
    }

    /// Push the latest notice document (a JSON object, or `null` when the
    /// document does not exist).
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is neither an object nor `null`.
    #[wasm_bindgen(js_name = pushNoticeDocument)]
    pub fn push_notice_document(&mut self, json: &str) -> Result<(), String> {
        let document: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        match document {
            serde_json::Value::Object(data) => self.source.set(NOTICE_DOCUMENT_PATH, data),
            serde_json::Value::Null => self.source.remove(NOTICE_DOCUMENT_PATH),
            _ => return Err("notice document must be an object or null".to_string()),
        }
        Ok(())
    }

    /// Set or clear the host's request link.
    #[wasm_bindgen(js_name = setNoticeLink)]
    pub fn set_notice_link(&mut self, link: Option<String>) {
        self.state.set_notice_link(link.as_deref());
    }

    /// Release the notice subscription.
    #[wasm_bindgen(js_name = stopNotice)]
    pub fn stop_notice(&mut self) {
        self.state.stop_notice();
    }

    /// The notice request button was pressed.
    #[wasm_bindgen(js_name = requestNotice)]
    pub fn request_notice(&mut self) -> bool {
        self.state.request_notice()
    }

    /// Whether the notice changed since the last call.
    #[wasm_bindgen(js_name = takeNoticeChanged)]
    pub fn take_notice_changed(&mut self) -> bool {
        self.state.take_notice_changed()
    }

    /// Get the current render view as JSON.
    #[wasm_bindgen(js_name = getViewJson)]
    #[must_use]
    pub fn get_view_json(&self) -> String {
        serde_json::to_string(&self.state.view()).unwrap_or_default()
    }

    /// Drain queued intents as a JSON array.
    #[wasm_bindgen(js_name = takeIntentsJson)]
    pub fn take_intents_json(&mut self) -> String {
        serde_json::to_string(&self.state.take_intents()).unwrap_or_default()
    }
}

impl Default for WasmShowreel {
    fn default() -> Self {
        Self::new()
    }
}
