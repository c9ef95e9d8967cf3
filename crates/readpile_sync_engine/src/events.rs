//! Event fan-out for sync and download phase transitions.
//!
//! The engine only raises these events; presentation layers subscribe
//! and redispatch to whatever execution context they need. Delivery may
//! happen on any thread.

use parking_lot::RwLock;
use readpile_sync_protocol::BookmarkId;
use std::sync::mpsc::{self, Receiver, Sender};

/// Phase transitions of a database sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The full sync began.
    SyncStarted,
    /// Folder reconciliation began.
    FoldersStarted,
    /// Folder reconciliation finished.
    FoldersEnded,
    /// Article reconciliation began.
    ArticlesStarted,
    /// Article reconciliation finished.
    ArticlesEnded,
    /// The full sync ended. Raised on every exit path, success or not.
    SyncEnded,
}

/// Phase transitions of a content download pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    /// The download pass began.
    Started,
    /// An article's body download began.
    ArticleStarted(BookmarkId),
    /// An article's image downloads began.
    ImagesStarted(BookmarkId),
    /// A single image download began.
    ImageStarted(BookmarkId),
    /// An article's image downloads finished.
    ImagesCompleted(BookmarkId),
    /// An article's download finished.
    ArticleCompleted(BookmarkId),
    /// The download pass ended.
    Completed,
}

/// Distributes events to registered subscribers.
///
/// The feed:
/// - Preserves emit order per subscriber
/// - Supports multiple subscribers
/// - Drops subscribers whose receiver is gone
/// - Is thread-safe
pub struct EventFeed<E: Clone> {
    subscribers: RwLock<Vec<Sender<E>>>,
}

impl<E: Clone> EventFeed<E> {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to the feed.
    ///
    /// Returns a receiver for all future events. Dropping the receiver
    /// unsubscribes on the next emit.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all live subscribers.
    pub fn emit(&self, event: E) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of live subscribers as of the last emit.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl<E: Clone> Default for EventFeed<E> {
    fn default() -> Self {
        Self::new()
    }
}
