//! Remote bookmark shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a bookmark, service-assigned and shared between the
/// local store and the service once synced.
///
/// Zero is the empty identity; the service starts assigning at one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct BookmarkId(u64);

impl BookmarkId {
    /// Creates a bookmark id from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true if this is the empty identity.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bookmark as the service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteBookmark {
    /// Bookmark identity.
    pub id: BookmarkId,
    /// Title.
    pub title: String,
    /// Canonical URL.
    pub url: String,
    /// Description or excerpt.
    pub description: String,
    /// Read progress in `[0, 1]`.
    pub read_progress: f64,
    /// Unix seconds of the last progress change.
    pub progress_timestamp: i64,
    /// Opaque service-assigned content fingerprint. Never computed
    /// locally.
    pub hash: String,
    /// Whether the bookmark is in the liked virtual collection.
    pub liked: bool,
}

/// Response of the diff-sync listing: what changed relative to the
/// fingerprints the client supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkDiff {
    /// Bookmarks that are new or differ from the supplied fingerprints.
    pub updates: Vec<RemoteBookmark>,
    /// Ids the service no longer has in the listed folder.
    pub deleted: Vec<BookmarkId>,
}

impl BookmarkDiff {
    /// Returns true if the diff carries no changes.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deleted.is_empty()
    }
}
