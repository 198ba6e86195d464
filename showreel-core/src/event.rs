//! Touch input and swipe interpretation for the hero carousel.

use serde::{Deserialize, Serialize};

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled by the platform.
    Cancel,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier.
    pub id: u32,
    /// Horizontal position in view coordinates.
    pub x: f32,
    /// Vertical position in view coordinates.
    pub y: f32,
}

impl TouchPoint {
    /// Create a touch point.
    #[must_use]
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// A touch event with the points that changed in this phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// Points that changed (for `End` these are the lifted fingers).
    pub touches: Vec<TouchPoint>,
    /// Timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp_ms: u64) -> Self {
        Self {
            phase,
            touches,
            timestamp_ms,
        }
    }

    /// Single-finger event at horizontal position `x`.
    #[must_use]
    pub fn single(phase: TouchPhase, x: f32) -> Self {
        Self::new(phase, vec![TouchPoint::new(0, x, 0.0)], 0)
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }
}

/// Direction of a recognised swipe, named by the navigation it causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Finger dragged leftward; show the next item.
    Next,
    /// Finger dragged rightward; show the previous item.
    Previous,
}

impl SwipeDirection {
    /// Classify a horizontal drag.
    ///
    /// `diff = start_x - end_x`. Displacements within `threshold` (inclusive)
    /// are taps or jitter and yield `None`.
    #[must_use]
    pub fn classify(start_x: f32, end_x: f32, threshold: f32) -> Option<Self> {
        let diff = start_x - end_x;
        if diff > threshold {
            Some(Self::Next)
        } else if diff < -threshold {
            Some(Self::Previous)
        } else {
            None
        }
    }

    /// Index delta this swipe applies.
    #[must_use]
    pub const fn delta(self) -> i64 {
        match self {
            Self::Next => 1,
            Self::Previous => -1,
        }
    }
}

/// Tracks the horizontal start of the active touch interaction.
///
/// Exists only between touch-start and touch-end/cancel. A second start
/// before the end overwrites the first; an end without a start is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureTracker {
    start_x: Option<f32>,
}

impl GestureTracker {
    /// Create an idle tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self { start_x: None }
    }

    /// Capture the start of an interaction.
    pub fn begin(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    /// Finish the interaction, returning the captured start if any.
    ///
    /// The session is cleared whether or not a start existed.
    pub fn finish(&mut self) -> Option<f32> {
        self.start_x.take()
    }

    /// Abandon the interaction.
    pub fn cancel(&mut self) {
        self.start_x = None;
    }

    /// Whether an interaction is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.start_x.is_some()
    }

    /// Captured start position.
    #[must_use]
    pub const fn start_x(&self) -> Option<f32> {
        self.start_x
    }
}
