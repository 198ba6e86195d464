//! Shared document storage.
//!
//! Provides a thread-safe [`DocumentStore`] shared by HTTP routes and
//! WebSocket connections. Every mutation is broadcast as a
//! [`DocumentSnapshot`] so subscribers always see whole documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use showreel_core::DocumentSnapshot;
use tokio::sync::broadcast;

use crate::validation::{validate_document, ValidationError};

/// Capacity of the change broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A persisted document could not be parsed.
    #[error("Serialization error in {path}: {message}")]
    Serialization {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        message: String,
    },
    /// The store was created without a data directory.
    #[error("No data directory configured")]
    NoDataDir,
}

/// Thread-safe map of document path to JSON object.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<String, Map<String, Value>>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
    events: broadcast::Sender<DocumentSnapshot>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            data_dir: None,
            events,
        }
    }

    /// Create a store persisted under `data_dir`, loading what is already
    /// there.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or read,
    /// or [`StoreError::Serialization`] if a stored document is corrupt.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let mut store = Self::new();
        store.data_dir = Some(data_dir);
        let loaded = store.load_all()?;
        tracing::info!(documents = loaded.len(), "document store loaded from disk");
        Ok(store)
    }

    /// Current fields of a document.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Map<String, Value>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Snapshot of a document, present or not.
    #[must_use]
    pub fn snapshot(&self, path: &str) -> DocumentSnapshot {
        match self.get(path) {
            Some(data) => DocumentSnapshot::present(path, data),
            None => DocumentSnapshot::absent(path),
        }
    }

    /// Replace a document.
    ///
    /// The write, its file and its broadcast happen under one lock, so
    /// subscribers and disk see changes in commit order.
    pub fn set(&self, path: &str, data: Map<String, Value>) -> DocumentSnapshot {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents.insert(path.to_string(), data.clone());
        self.persist(path, Some(&data));
        self.publish(DocumentSnapshot::present(path, data))
    }

    /// Shallow-merge fields into a document, creating it if needed.
    ///
    /// `null` values remove the field. Nothing changes if the merged
    /// document would be too large.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DocumentTooLarge`] if the result exceeds
    /// the document size limit.
    pub fn merge(
        &self,
        path: &str,
        patch: Map<String, Value>,
    ) -> Result<DocumentSnapshot, ValidationError> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut merged = documents.get(path).cloned().unwrap_or_default();
        for (key, value) in patch {
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        validate_document(&merged)?;
        documents.insert(path.to_string(), merged.clone());
        self.persist(path, Some(&merged));
        Ok(self.publish(DocumentSnapshot::present(path, merged)))
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, path: &str) -> bool {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let existed = documents.remove(path).is_some();
        if existed {
            self.persist(path, None);
            self.publish(DocumentSnapshot::absent(path));
        }
        existed
    }

    /// All stored document paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the persistence directory (if any) is still present.
    #[must_use]
    pub fn storage_available(&self) -> bool {
        self.data_dir.as_ref().map_or(true, |dir| dir.is_dir())
    }

    /// Receive every change from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentSnapshot> {
        self.events.subscribe()
    }

    fn publish(&self, snapshot: DocumentSnapshot) -> DocumentSnapshot {
        // No receivers is fine.
        let _ = self.events.send(snapshot.clone());
        snapshot
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write or remove a document's file.
    ///
    /// No-op if the store was created without a data directory.
    fn persist(&self, path: &str, data: Option<&Map<String, Value>>) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let file = data_dir.join(file_name_for(path));
        let result = match data {
            Some(data) => serde_json::to_string_pretty(data)
                .map_err(std::io::Error::other)
                .and_then(|json| std::fs::write(&file, json)),
            None if file.exists() => std::fs::remove_file(&file),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist document {path} to {}: {e}", file.display());
        }
    }

    /// Load every persisted document from the data directory.
    ///
    /// Returns the paths that were found on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory can't be read or a file can't be
    /// parsed.
    pub fn load_all(&self) -> Result<Vec<String>, StoreError> {
        let data_dir = self.data_dir.as_ref().ok_or(StoreError::NoDataDir)?;
        let mut loaded = Vec::new();
        for entry in std::fs::read_dir(data_dir)? {
            let file = entry?.path();
            let Some(path) = path_for_file(&file) else {
                continue;
            };
            let contents = std::fs::read_to_string(&file)?;
            let data: Map<String, Value> =
                serde_json::from_str(&contents).map_err(|e| StoreError::Serialization {
                    path: file.display().to_string(),
                    message: e.to_string(),
                })?;
            self.documents
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.clone(), data);
            loaded.push(path);
        }
        loaded.sort();
        Ok(loaded)
    }
}

/// File name for a document path: `settings/config` → `settings.config.json`.
///
/// Any character that is not alphanumeric, `-`, `_` or `/` becomes `_`.
fn file_name_for(path: &str) -> String {
    let stem: String = path
        .chars()
        .map(|c| match c {
            '/' => '.',
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();
    format!("{stem}.json")
}

/// Inverse of [`file_name_for`] for files in the data directory.
fn path_for_file(file: &Path) -> Option<String> {
    if !file.extension().is_some_and(|ext| ext == "json") {
        return None;
    }
    let stem = file.file_stem()?.to_str()?;
    Some(stem.replace('.', "/"))
}
