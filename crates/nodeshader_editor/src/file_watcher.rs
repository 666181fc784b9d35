// SPDX-License-Identifier: MIT OR Apache-2.0
//! File system watcher for graph documents.
//!
//! Watches the directory holding each document rather than the file itself,
//! so saves that replace the file (write to a temp file, then rename) are
//! still seen. Events for other files in those directories are dropped.

use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Events emitted by the graph watcher
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphEvent {
    /// The document was written, created or renamed into place
    Changed(PathBuf),
    /// The document was deleted
    Removed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Error type for the graph watcher
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Watcher backend failure
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// Path could not be resolved
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path has no parent directory
    #[error("Cannot watch {0:?}: no parent directory")]
    NoParent(PathBuf),
}

/// Debounced watcher for a set of graph documents
pub struct GraphWatcher {
    /// The underlying debounced watcher
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    /// Receiver for document events
    event_rx: Receiver<GraphEvent>,
    /// Watched documents (canonical paths), shared with the debouncer thread
    documents: Arc<RwLock<HashSet<PathBuf>>>,
    /// Watched directories and how many documents live in each
    directories: HashMap<PathBuf, usize>,
}

impl GraphWatcher {
    /// Create a watcher that reports changes after `debounce` of quiet
    pub fn new(debounce: Duration) -> Result<Self, WatchError> {
        let (event_tx, event_rx) = mpsc::channel();
        let documents: Arc<RwLock<HashSet<PathBuf>>> = Arc::default();
        let tracked = Arc::clone(&documents);

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let documents = tracked.read();
                    let mut seen = HashSet::new();
                    for event in events {
                        let Some(changed) = classify(&event.kind) else {
                            continue;
                        };
                        for path in event.paths.iter().filter(|p| documents.contains(*p)) {
                            let graph_event = if changed {
                                GraphEvent::Changed(path.clone())
                            } else {
                                GraphEvent::Removed(path.clone())
                            };
                            // One event per document and kind for each debounced batch
                            if seen.insert(graph_event.clone()) {
                                let _ = event_tx.send(graph_event);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(GraphEvent::Error(error.to_string()));
                    }
                }
            }
        })?;

        Ok(Self {
            debouncer,
            event_rx,
            documents,
            directories: HashMap::new(),
        })
    }

    /// Start watching a document; returns its canonical path
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<PathBuf, WatchError> {
        let path = std::fs::canonicalize(path.as_ref())?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| WatchError::NoParent(path.clone()))?;

        if !self.documents.write().insert(path.clone()) {
            return Ok(path);
        }
        if !self.directories.contains_key(&dir) {
            if let Err(err) = self.debouncer.watch(&dir, RecursiveMode::NonRecursive) {
                self.documents.write().remove(&path);
                return Err(err.into());
            }
        }
        *self.directories.entry(dir).or_insert(0) += 1;

        tracing::info!("Watching document for changes: {:?}", path);
        Ok(path)
    }

    /// Stop watching a document
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<(), WatchError> {
        let path = std::fs::canonicalize(path.as_ref())?;
        if !self.documents.write().remove(&path) {
            return Ok(());
        }

        if let Some(dir) = path.parent() {
            if let Some(count) = self.directories.get_mut(dir) {
                *count -= 1;
                if *count == 0 {
                    self.directories.remove(dir);
                    self.debouncer.unwatch(dir)?;
                }
            }
        }
        tracing::info!("Stopped watching document: {:?}", path);
        Ok(())
    }

    /// Check if a document is being watched
    pub fn is_watching(&self, path: &Path) -> bool {
        std::fs::canonicalize(path).is_ok_and(|p| self.documents.read().contains(&p))
    }

    /// Get all watched documents
    pub fn watched_documents(&self) -> Vec<PathBuf> {
        self.documents.read().iter().cloned().collect()
    }

    /// Poll for pending events (non-blocking)
    pub fn poll_events(&self) -> Vec<GraphEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Graph watcher channel disconnected");
                    break;
                }
            }
        }
        events
    }

    /// Block until an event arrives or `timeout` passes
    pub fn wait_event(&self, timeout: Duration) -> Option<GraphEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("Graph watcher channel disconnected");
                None
            }
        }
    }
}

/// `Some(true)` for events that leave a readable document behind,
/// `Some(false)` for deletions, `None` for events to ignore
fn classify(kind: &EventKind) -> Option<bool> {
    use notify::event::{ModifyKind, RenameMode};

    match kind {
        EventKind::Create(_) => Some(true),
        // The old name of a rename no longer holds the document
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(false),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(true),
        EventKind::Remove(_) => Some(false),
        EventKind::Any | EventKind::Access(_) | EventKind::Other => None,
    }
}
