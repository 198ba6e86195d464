//! # Showreel Core
//!
//! Presentation state for a streaming catalog browser.
//! Compiles to WASM so browser hosts drive the same engine as native ones.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             showreel-core.wasm              │
//! ├─────────────────────────────────────────────┤
//! │  Poster Grid     │  Hero Carousel           │
//! │  - Load phases   │  - Wrap-around index     │
//! │  - Stale guards  │  - Swipe threshold       │
//! │                  │  - Dot indicator         │
//! ├─────────────────────────────────────────────┤
//! │  Live Notice     │  Browse State            │
//! │  - Partial merge │  - Intent outbox         │
//! │  - Link override │  - Tabs and favorites    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The engine never fetches images, routes, or persists anything. Those are
//! host duties; the engine emits [`Intent`]s and consumes outcomes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod carousel;
pub mod catalog;
pub mod error;
pub mod event;
pub mod intent;
pub mod notice;
pub mod source;
pub mod state;
pub mod story;
pub mod tile;
pub mod trending;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use carousel::{CarouselConfig, CarouselEngine, DotIndicator, DEFAULT_SWIPE_THRESHOLD};
pub use catalog::{items_from_json, CatalogItem, ItemId, Rating, Ribbon};
pub use error::{ShowreelError, ShowreelResult, SyncError};
pub use event::{GestureTracker, SwipeDirection, TouchEvent, TouchPhase, TouchPoint};
pub use intent::{Intent, Tab, TabBar, TabEntry};
pub use notice::{
    LiveConfigSync, NoticeConfig, NoticeDefaults, NoticeSnapshot, NoticeState, NoticeView,
};
pub use source::{
    DocumentSnapshot, DocumentSource, MemoryDocumentSource, SnapshotListener, SnapshotResult,
    Subscription,
};
pub use state::{BrowseState, BrowseView, HeroView, StoryView, TileEntry};
pub use story::{story_caption, StoryBadge, StoryEntry};
pub use tile::{LoadPhase, TileBoard, TileLoadState, TileView};
pub use trending::{trending_entries, TrendingEntry, TRENDING_LIMIT};

/// Showreel core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
