//! # Remote Document Sources
//!
//! The seam between the engine and whatever transport carries remote
//! documents. A [`DocumentSource`] delivers [`DocumentSnapshot`]s for a path
//! to a listener until the returned [`Subscription`] is released.
//!
//! [`MemoryDocumentSource`] is the in-process implementation: the current
//! document is delivered immediately on subscribe, then every change.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

/// One delivered state of a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Document path, e.g. `settings/config`.
    pub path: String,
    /// Document fields; `None` when the document does not exist.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl DocumentSnapshot {
    /// Snapshot of an existing document.
    #[must_use]
    pub fn present(path: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
        }
    }

    /// Snapshot of a missing document.
    #[must_use]
    pub fn absent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    /// Whether the document exists.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// What a listener receives: a snapshot or a subscription failure.
pub type SnapshotResult = Result<DocumentSnapshot, SyncError>;

/// Callback invoked for every delivery.
pub type SnapshotListener = Box<dyn FnMut(SnapshotResult)>;

/// Handle to a live subscription.
pub trait Subscription {
    /// Stop deliveries. Calling it more than once has no further effect.
    fn unsubscribe(&mut self);
}

/// A store of remote documents that can be watched.
pub trait DocumentSource {
    /// Watch the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unavailable`] if the subscription cannot be
    /// established.
    fn subscribe(
        &self,
        path: &str,
        listener: SnapshotListener,
    ) -> Result<Box<dyn Subscription>, SyncError>;
}

type SharedListener = Rc<RefCell<SnapshotListener>>;

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<String, Map<String, Value>>,
    listeners: Vec<(u64, String, SharedListener)>,
    next_id: u64,
    unavailable: bool,
}

impl MemoryInner {
    fn listeners_for(&self, path: &str) -> Vec<SharedListener> {
        self.listeners
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(_, _, l)| Rc::clone(l))
            .collect()
    }
}

/// In-process document source with snapshot semantics.
///
/// Clones share the same documents and listeners.
#[derive(Clone, Default)]
pub struct MemoryDocumentSource {
    inner: Rc<RefCell<MemoryInner>>,
}

impl std::fmt::Debug for MemoryDocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryDocumentSource")
            .field("documents", &inner.documents)
            .field("listeners", &inner.listeners.len())
            .field("unavailable", &inner.unavailable)
            .finish()
    }
}

impl MemoryDocumentSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make further subscribe attempts fail (simulates being offline).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.borrow_mut().unavailable = unavailable;
    }

    /// Current fields of a document.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Map<String, Value>> {
        self.inner.borrow().documents.get(path).cloned()
    }

    /// Replace a document and notify its listeners.
    pub fn set(&self, path: &str, data: Map<String, Value>) {
        self.inner
            .borrow_mut()
            .documents
            .insert(path.to_string(), data.clone());
        self.notify(path, &Ok(DocumentSnapshot::present(path, data)));
    }

    /// Shallow-merge fields into a document (creating it if needed).
    ///
    /// `null` values remove the field.
    pub fn merge(&self, path: &str, patch: Map<String, Value>) {
        let merged = {
            let mut inner = self.inner.borrow_mut();
            let doc = inner.documents.entry(path.to_string()).or_default();
            for (key, value) in patch {
                if value.is_null() {
                    doc.remove(&key);
                } else {
                    doc.insert(key, value);
                }
            }
            doc.clone()
        };
        self.notify(path, &Ok(DocumentSnapshot::present(path, merged)));
    }

    /// Delete a document and notify its listeners.
    pub fn remove(&self, path: &str) {
        self.inner.borrow_mut().documents.remove(path);
        self.notify(path, &Ok(DocumentSnapshot::absent(path)));
    }

    /// Deliver a failure to every listener of `path`.
    pub fn fail(&self, path: &str, error: SyncError) {
        self.notify(path, &Err(error));
    }

    /// Number of live listeners on `path`.
    #[must_use]
    pub fn listener_count(&self, path: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, p, _)| p == path)
            .count()
    }

    fn notify(&self, path: &str, event: &SnapshotResult) {
        // Release the borrow before calling out; listeners may touch the source.
        let listeners = self.inner.borrow().listeners_for(path);
        for listener in listeners {
            deliver(&listener, event.clone());
        }
    }
}

fn deliver(listener: &SharedListener, event: SnapshotResult) {
    match listener.try_borrow_mut() {
        Ok(mut callback) => callback(event),
        Err(_) => tracing::warn!("dropping re-entrant snapshot delivery"),
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn subscribe(
        &self,
        path: &str,
        listener: SnapshotListener,
    ) -> Result<Box<dyn Subscription>, SyncError> {
        let (id, listener, current) = {
            let mut inner = self.inner.borrow_mut();
            if inner.unavailable {
                return Err(SyncError::Unavailable(format!("{path}: source offline")));
            }
            let id = inner.next_id;
            inner.next_id += 1;
            let listener: SharedListener = Rc::new(RefCell::new(listener));
            inner
                .listeners
                .push((id, path.to_string(), Rc::clone(&listener)));
            (id, listener, inner.documents.get(path).cloned())
        };

        let snapshot = match current {
            Some(data) => DocumentSnapshot::present(path, data),
            None => DocumentSnapshot::absent(path),
        };
        deliver(&listener, Ok(snapshot));

        Ok(Box::new(MemorySubscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }))
    }
}

struct MemorySubscription {
    id: u64,
    inner: Weak<RefCell<MemoryInner>>,
}

impl Subscription for MemorySubscription {
    fn unsubscribe(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .borrow_mut()
                .listeners
                .retain(|(id, _, _)| *id != self.id);
        }
        self.inner = Weak::new();
    }
}
