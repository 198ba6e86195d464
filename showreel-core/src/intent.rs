//! Outbound intents and the bottom tab bar.
//!
//! The engine owns no routing or favorite persistence. User actions become
//! [`Intent`] values handed up to the host, which decides what they mean.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;

/// Top-level destinations of the bottom tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Home feed.
    #[default]
    Home,
    /// Search.
    Search,
    /// The user's saved titles.
    Favorites,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Self; 3] = [Self::Home, Self::Search, Self::Favorites];

    /// Label under the tab icon.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Search => "Search",
            Self::Favorites => "My List",
        }
    }
}

/// A user action the host must carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Intent {
    /// Show the detail page of an item.
    Open(ItemId),
    /// Start playback of an item.
    Play(ItemId),
    /// Flip the favorite flag of an item.
    ToggleFavorite(ItemId),
    /// Switch to another tab.
    ChangeTab(Tab),
    /// Open an external link (notice request button).
    OpenLink(String),
}

/// One entry of the rendered tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabEntry {
    /// The tab.
    pub tab: Tab,
    /// Its label.
    pub label: &'static str,
    /// Whether it is the active tab.
    pub active: bool,
}

/// Bottom tab bar. The active tab and visibility are host inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabBar {
    /// Tab the host reports as active.
    pub active: Tab,
    /// Whether the bar is shown (hosts hide it while scrolling or playing).
    pub visible: bool,
}

impl TabBar {
    /// Create a visible bar with `active` selected.
    #[must_use]
    pub const fn new(active: Tab) -> Self {
        Self {
            active,
            visible: true,
        }
    }

    /// Entries to draw, or nothing when the bar is hidden.
    #[must_use]
    pub fn entries(&self) -> Vec<TabEntry> {
        if !self.visible {
            return Vec::new();
        }
        Tab::ALL
            .iter()
            .map(|&tab| TabEntry {
                tab,
                label: tab.label(),
                active: tab == self.active,
            })
            .collect()
    }

    /// A tab was pressed.
    #[must_use]
    pub const fn select(&self, tab: Tab) -> Intent {
        Intent::ChangeTab(tab)
    }
}
