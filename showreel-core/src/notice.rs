//! # Live Notice Sync
//!
//! Keeps the scrolling notice banner in step with a remote config document.
//!
//! ## Merge rules
//!
//! ```text
//! document absent         → nothing changes, defaults stay
//! field absent or empty   → local value kept (updates are additive)
//! field of the wrong type → that field ignored, siblings still applied
//! enabled: false          → a real value, applied
//! action link             → host override > remote link > default
//! ```
//!
//! Subscription failures never reach the host: the last known values stay
//! on screen.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;
use crate::intent::Intent;
use crate::source::{DocumentSnapshot, DocumentSource, SnapshotResult, Subscription};

/// Path of the notice document in the remote store.
pub const NOTICE_DOCUMENT_PATH: &str = "settings/config";

/// Text shown until the remote document says otherwise.
pub const DEFAULT_NOTICE_TEXT: &str = "🎬 New Content Added Daily! Enjoy High-Speed Streaming. \
     ⚠️ Can't find your favorite movie or series? Send us a request!";

/// Request link used until the remote document or the host supplies one.
pub const DEFAULT_ACTION_LINK: &str = "https://t.me/showreelrequests";

/// Separator between the two copies of the text in the marquee.
const MARQUEE_SEPARATOR: &str = "\u{a0}\u{a0}\u{a0}•\u{a0}\u{a0}\u{a0}";

/// Fallback values for the notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoticeDefaults {
    /// Fallback banner text.
    pub text: String,
    /// Fallback request link.
    pub action_link: String,
}

impl Default for NoticeDefaults {
    fn default() -> Self {
        Self {
            text: DEFAULT_NOTICE_TEXT.to_string(),
            action_link: DEFAULT_ACTION_LINK.to_string(),
        }
    }
}

/// Fields of the remote notice document. Every field is optional so that
/// "absent" and "present but false" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeSnapshot {
    /// Banner text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether the banner is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Notice-specific request link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_link: Option<String>,
    /// General channel link, used when no notice-specific link is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_link: Option<String>,
}

const TEXT_KEYS: [&str; 2] = ["text", "noticeText"];
const ENABLED_KEYS: [&str; 2] = ["enabled", "noticeEnabled"];
const ACTION_LINK_KEYS: [&str; 2] = ["actionLink", "noticeChannelLink"];
const CHANNEL_LINK_KEYS: [&str; 1] = ["channelLink"];

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// First usable value among `keys`, skipping entries of the wrong type.
fn field<'a, T>(
    data: &'a Map<String, Value>,
    keys: &[&str],
    read: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    keys.iter().find_map(|key| {
        let value = data.get(*key)?;
        let parsed = read(value);
        if parsed.is_none() && !value.is_null() && value.as_str() != Some("") {
            tracing::warn!(field = *key, "notice field has an unexpected value, ignored");
        }
        parsed
    })
}

fn string_field(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(data, keys, |value| match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        _ => None,
    })
}

impl NoticeSnapshot {
    /// Read the notice fields out of a document.
    ///
    /// Each field is read on its own: the primary name first, then its
    /// legacy alias. A field of the wrong type is skipped without affecting
    /// its siblings.
    #[must_use]
    pub fn from_document(data: &Map<String, Value>) -> Self {
        Self {
            text: string_field(data, &TEXT_KEYS),
            enabled: field(data, &ENABLED_KEYS, Value::as_bool),
            action_link: string_field(data, &ACTION_LINK_KEYS),
            channel_link: string_field(data, &CHANNEL_LINK_KEYS),
        }
    }

    /// Remote link: the notice-specific one, else the channel link.
    #[must_use]
    pub fn remote_link(&self) -> Option<&str> {
        non_empty(self.action_link.as_deref()).or_else(|| non_empty(self.channel_link.as_deref()))
    }
}

/// Resolved notice state as the banner sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeConfig {
    /// Banner text.
    pub text: String,
    /// Whether the banner is shown.
    pub enabled: bool,
    /// Request link after precedence rules.
    pub action_link: String,
}

/// What the banner draws. Only exists while the notice is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    /// Banner text.
    pub text: String,
    /// Text repeated for a seamless scrolling loop.
    pub marquee: String,
    /// Request link.
    pub link: String,
}

impl NoticeView {
    /// The request button was pressed.
    #[must_use]
    pub fn request(&self) -> Intent {
        Intent::OpenLink(self.link.clone())
    }
}

impl NoticeConfig {
    /// Banner content, or `None` when the notice is disabled.
    #[must_use]
    pub fn view(&self) -> Option<NoticeView> {
        self.enabled.then(|| NoticeView {
            text: self.text.clone(),
            marquee: format!(
                "{text}{MARQUEE_SEPARATOR}{text}\u{a0}\u{a0}\u{a0}",
                text = self.text
            ),
            link: self.action_link.clone(),
        })
    }
}

/// Local notice state: defaults, merged remote fields and the host override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeState {
    defaults: NoticeDefaults,
    text: String,
    enabled: bool,
    remote_link: Option<String>,
    override_link: Option<String>,
}

impl Default for NoticeState {
    fn default() -> Self {
        Self::new(NoticeDefaults::default())
    }
}

impl NoticeState {
    /// Start from the given defaults.
    #[must_use]
    pub fn new(defaults: NoticeDefaults) -> Self {
        Self {
            text: defaults.text.clone(),
            enabled: true,
            remote_link: None,
            override_link: None,
            defaults,
        }
    }

    /// Merge a remote snapshot. Returns whether the resolved config changed.
    pub fn apply(&mut self, snapshot: &NoticeSnapshot) -> bool {
        let before = self.resolved();

        if let Some(text) = non_empty(snapshot.text.as_deref()) {
            self.text = text.to_string();
        }
        if let Some(enabled) = snapshot.enabled {
            self.enabled = enabled;
        }
        if let Some(link) = snapshot.remote_link() {
            self.remote_link = Some(link.to_string());
        }

        self.resolved() != before
    }

    /// Set or clear the host-supplied link. Empty strings clear it.
    ///
    /// Returns whether the resolved config changed.
    pub fn set_override(&mut self, link: Option<&str>) -> bool {
        let before = self.resolved();
        self.override_link = non_empty(link).map(str::to_string);
        self.resolved() != before
    }

    /// Current resolved config.
    #[must_use]
    pub fn resolved(&self) -> NoticeConfig {
        let action_link = self
            .override_link
            .as_deref()
            .or(self.remote_link.as_deref())
            .unwrap_or(&self.defaults.action_link)
            .to_string();
        NoticeConfig {
            text: self.text.clone(),
            enabled: self.enabled,
            action_link,
        }
    }
}

/// Callback fired with the resolved config whenever it changes.
pub type UpdateCallback = Box<dyn FnMut(&NoticeConfig)>;

struct SyncShared {
    notice: NoticeState,
    alive: bool,
    on_update: Option<UpdateCallback>,
}

/// Subscription to the remote notice document.
///
/// Release happens exactly once: through [`LiveConfigSync::stop`] or, if the
/// owner never called it, on drop. After that every delivery is ignored.
pub struct LiveConfigSync {
    shared: Rc<RefCell<SyncShared>>,
    subscription: Option<Box<dyn Subscription>>,
}

impl std::fmt::Debug for LiveConfigSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("LiveConfigSync")
            .field("notice", &shared.notice)
            .field("alive", &shared.alive)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl Default for LiveConfigSync {
    fn default() -> Self {
        Self::new(NoticeDefaults::default())
    }
}

impl LiveConfigSync {
    /// Create a sync holding the defaults. Nothing is subscribed yet.
    #[must_use]
    pub fn new(defaults: NoticeDefaults) -> Self {
        Self {
            shared: Rc::new(RefCell::new(SyncShared {
                notice: NoticeState::new(defaults),
                alive: true,
                on_update: None,
            })),
            subscription: None,
        }
    }

    /// Subscribe to the notice document at `path`.
    ///
    /// Failures are logged and swallowed; the defaults stay in effect.
    /// Returns whether a subscription was established. Starting again
    /// replaces the previous subscription; starting after [`stop`] does
    /// nothing.
    ///
    /// [`stop`]: LiveConfigSync::stop
    pub fn start<S, F>(&mut self, source: &S, path: &str, on_update: F) -> bool
    where
        S: DocumentSource + ?Sized,
        F: FnMut(&NoticeConfig) + 'static,
    {
        if self.is_stopped() {
            tracing::warn!(path, "ignoring start on a stopped notice sync");
            return false;
        }
        if let Some(mut previous) = self.subscription.take() {
            previous.unsubscribe();
        }
        self.shared.borrow_mut().on_update = Some(Box::new(on_update));

        let weak = Rc::downgrade(&self.shared);
        let listener = Box::new(move |event: SnapshotResult| handle_delivery(&weak, event));

        match source.subscribe(path, listener) {
            Ok(subscription) => {
                tracing::debug!(path, "notice sync subscribed");
                self.subscription = Some(subscription);
                true
            }
            Err(e) => {
                tracing::warn!(path, "notice sync unavailable, keeping defaults: {e}");
                false
            }
        }
    }

    /// Set or clear the host-supplied request link.
    ///
    /// Takes precedence over the remote link from now on, including over
    /// snapshots that arrive later.
    pub fn set_action_override(&mut self, link: Option<&str>) {
        let changed = {
            let mut shared = self.shared.borrow_mut();
            shared.alive && shared.notice.set_override(link)
        };
        if changed {
            notify(&self.shared);
        }
    }

    /// Current resolved config.
    #[must_use]
    pub fn config(&self) -> NoticeConfig {
        self.shared.borrow().notice.resolved()
    }

    /// Banner content, or `None` when disabled.
    #[must_use]
    pub fn view(&self) -> Option<NoticeView> {
        self.config().view()
    }

    /// Whether a subscription is currently held.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether [`LiveConfigSync::stop`] has run.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        !self.shared.borrow().alive
    }

    /// Release the subscription. Safe to call when `start` never succeeded
    /// and safe to call twice.
    pub fn stop(&mut self) {
        let callback = {
            let mut shared = self.shared.borrow_mut();
            if !shared.alive {
                return;
            }
            shared.alive = false;
            shared.on_update.take()
        };
        drop(callback);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        tracing::debug!("notice sync stopped");
    }
}

impl Drop for LiveConfigSync {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_delivery(shared: &Weak<RefCell<SyncShared>>, event: SnapshotResult) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let changed = {
        let Ok(mut state) = shared.try_borrow_mut() else {
            tracing::warn!("notice snapshot arrived during an update, skipped");
            return;
        };
        if !state.alive {
            return;
        }
        match parse(event) {
            Ok(Some(snapshot)) => state.notice.apply(&snapshot),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("notice sync degraded, keeping last values: {e}");
                false
            }
        }
    };
    if changed {
        notify(&shared);
    }
}

fn parse(event: SnapshotResult) -> Result<Option<NoticeSnapshot>, SyncError> {
    let DocumentSnapshot { data, .. } = event?;
    Ok(data.map(|fields| NoticeSnapshot::from_document(&fields)))
}

/// Run the update callback outside the borrow so it may read the sync.
fn notify(shared: &Rc<RefCell<SyncShared>>) {
    let (config, callback) = {
        let mut state = shared.borrow_mut();
        (state.notice.resolved(), state.on_update.take())
    };
    tracing::debug!(enabled = config.enabled, "notice updated");
    let Some(mut callback) = callback else {
        return;
    };
    callback(&config);
    let mut state = shared.borrow_mut();
    if state.alive && state.on_update.is_none() {
        state.on_update = Some(callback);
    }
}
