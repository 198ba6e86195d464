//! # Hero Carousel
//!
//! Index management for the rotating hero banner.
//!
//! Every index the carousel exposes is wrapped modulo the item count: there
//! is no clamping and no invalid input. Swipes, dot clicks and autoplay ticks
//! all funnel into [`CarouselEngine::advance`] or
//! [`CarouselEngine::select_index`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;
use crate::event::{GestureTracker, SwipeDirection, TouchEvent, TouchPhase};
use crate::intent::Intent;

/// Minimum horizontal travel, in view units, for a drag to count as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 45.0;

/// Carousel tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarouselConfig {
    /// Drags whose horizontal travel does not exceed this are taps.
    pub swipe_threshold: f32,
    /// Autoplay period in milliseconds; `None` disables autoplay.
    pub autoplay_interval_ms: Option<u64>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            autoplay_interval_ms: None,
        }
    }
}

impl CarouselConfig {
    /// Autoplay period for the host's timer.
    #[must_use]
    pub fn autoplay_interval(&self) -> Option<Duration> {
        self.autoplay_interval_ms.map(Duration::from_millis)
    }
}

/// State for an external dot indicator.
///
/// Only produced when there is more than one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotIndicator {
    /// Number of dots (one per item).
    pub count: usize,
    /// Index of the highlighted dot.
    pub active: usize,
}

impl DotIndicator {
    /// Whether dot `index` is highlighted.
    #[must_use]
    pub const fn is_active(&self, index: usize) -> bool {
        index == self.active
    }

    /// Highlight flag per dot, in order.
    pub fn dots(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.count).map(move |i| self.is_active(i))
    }
}

/// Wrap `base + delta` into `[0, len)`. `len` must be non-zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // result is in [0, len)
fn wrap(base: usize, delta: i64, len: usize) -> usize {
    let n = len as i128;
    (base as i128 + i128::from(delta)).rem_euclid(n) as usize
}

/// Navigation engine for the hero carousel.
#[derive(Debug, Clone, Default)]
pub struct CarouselEngine {
    items: Vec<CatalogItem>,
    current: usize,
    gesture: GestureTracker,
    config: CarouselConfig,
}

impl CarouselEngine {
    /// Create a carousel over `items` showing the first one.
    #[must_use]
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self::with_config(items, CarouselConfig::default())
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(items: Vec<CatalogItem>, config: CarouselConfig) -> Self {
        Self {
            items,
            current: 0,
            gesture: GestureTracker::new(),
            config,
        }
    }

    /// Get the current configuration.
    #[must_use]
    pub const fn config(&self) -> &CarouselConfig {
        &self.config
    }

    /// Update the configuration.
    pub fn set_config(&mut self, config: CarouselConfig) {
        self.config = config;
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the carousel has nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Index of the item on screen; `None` when empty.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.current)
    }

    /// The item on screen.
    #[must_use]
    pub fn current(&self) -> Option<&CatalogItem> {
        self.items.get(self.current)
    }

    /// Jump to `index` (wrapped). No-op when empty.
    ///
    /// Returns whether the index changed.
    pub fn select_index(&mut self, index: i64) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.move_to(wrap(0, index, self.items.len()))
    }

    /// Move by `delta` items, wrapping in both directions. No-op when empty.
    ///
    /// Returns whether the index changed.
    pub fn advance(&mut self, delta: i64) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.move_to(wrap(self.current, delta, self.items.len()))
    }

    fn move_to(&mut self, index: usize) -> bool {
        if index == self.current {
            return false;
        }
        tracing::debug!(from = self.current, to = index, "carousel index changed");
        self.current = index;
        true
    }

    /// Turn a completed drag into navigation.
    ///
    /// Returns the swipe that was applied, if any. Drags within `threshold`
    /// and carousels with fewer than two items never navigate.
    pub fn interpret_gesture(
        &mut self,
        start_x: f32,
        end_x: f32,
        threshold: f32,
    ) -> Option<SwipeDirection> {
        if self.items.len() <= 1 {
            return None;
        }
        let direction = SwipeDirection::classify(start_x, end_x, threshold)?;
        self.advance(direction.delta());
        Some(direction)
    }

    /// Capture the start of a touch interaction.
    pub fn touch_start(&mut self, x: f32) {
        self.gesture.begin(x);
    }

    /// Resolve the active touch interaction ending at `x`.
    ///
    /// The interaction is cleared whether or not it navigated. Without a
    /// matching start this does nothing.
    pub fn touch_end(&mut self, x: f32) -> Option<SwipeDirection> {
        let start_x = self.gesture.finish()?;
        self.interpret_gesture(start_x, x, self.config.swipe_threshold)
    }

    /// Abandon the active touch interaction.
    pub fn touch_cancel(&mut self) {
        self.gesture.cancel();
    }

    /// Whether a touch interaction is in progress.
    #[must_use]
    pub const fn is_touching(&self) -> bool {
        self.gesture.is_active()
    }

    /// Process a raw touch event.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> Option<SwipeDirection> {
        match event.phase {
            TouchPhase::Start => {
                if let Some(point) = event.primary_touch() {
                    self.touch_start(point.x);
                }
                None
            }
            TouchPhase::Move => None,
            TouchPhase::End => match event.primary_touch() {
                Some(point) => self.touch_end(point.x),
                None => {
                    self.touch_cancel();
                    None
                }
            },
            TouchPhase::Cancel => {
                self.touch_cancel();
                None
            }
        }
    }

    /// Autoplay step driven by the host's timer.
    ///
    /// Skipped while the user is touching the banner or when there is
    /// nothing to rotate. Returns whether the index changed.
    pub fn tick(&mut self) -> bool {
        if self.items.len() <= 1 || self.gesture.is_active() {
            return false;
        }
        self.advance(1)
    }

    /// Replace the item list.
    ///
    /// Identical identities keep the index; otherwise the index follows the
    /// previously shown item when it survived, or is clamped to the new end.
    pub fn set_items(&mut self, items: Vec<CatalogItem>) {
        let same_identity = self.items.len() == items.len()
            && self.items.iter().zip(&items).all(|(a, b)| a.id == b.id);

        let next = if items.is_empty() {
            0
        } else if same_identity {
            self.current
        } else if let Some(pos) = self
            .current()
            .and_then(|shown| items.iter().position(|item| item.id == shown.id))
        {
            pos
        } else {
            self.current.min(items.len() - 1)
        };

        if !same_identity {
            self.gesture.cancel();
            tracing::debug!(count = items.len(), index = next, "carousel items replaced");
        }
        self.items = items;
        self.current = next;
    }

    /// Dot indicator state; `None` when there are fewer than two items.
    #[must_use]
    pub fn indicator(&self) -> Option<DotIndicator> {
        (self.items.len() > 1).then_some(DotIndicator {
            count: self.items.len(),
            active: self.current,
        })
    }

    /// Play button on the hero.
    #[must_use]
    pub fn play(&self) -> Option<Intent> {
        self.current().map(|item| Intent::Play(item.id.clone()))
    }

    /// Info button or banner click on the hero.
    #[must_use]
    pub fn open(&self) -> Option<Intent> {
        self.current().map(|item| Intent::Open(item.id.clone()))
    }
}
