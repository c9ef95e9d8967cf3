//! Local data model: folders, articles, and pending-change rows.

use readpile_sync_protocol::{
    BookmarkId, FolderSelector, HaveStatus, ProtocolError, RemoteBookmark, RemoteFolderId,
};
use std::fmt;

/// Stable local identity of a folder. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalFolderId(i64);

impl LocalFolderId {
    /// The well-known unread folder.
    pub const UNREAD: LocalFolderId = LocalFolderId(1);

    /// The well-known archive folder.
    pub const ARCHIVE: LocalFolderId = LocalFolderId(2);

    /// First id available for user folders.
    pub(crate) const FIRST_USER: i64 = 3;

    /// Creates a local folder id from its raw value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns true for the two permanent well-known folders.
    pub const fn is_well_known(self) -> bool {
        self.0 == Self::UNREAD.0 || self.0 == Self::ARCHIVE.0
    }
}

impl fmt::Display for LocalFolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A folder as the local store holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Stable local identity.
    pub local_id: LocalFolderId,
    /// Remote identity; `None` only while a pending add for this folder
    /// is still queued.
    pub remote_id: Option<RemoteFolderId>,
    /// Title.
    pub title: String,
    /// Service-assigned ordering key.
    pub position: i64,
    /// Whether the service wants this folder synced.
    pub should_sync: bool,
}

impl Folder {
    /// Returns the selector for listing this folder on the service.
    ///
    /// Well-known folders always resolve; user folders resolve only
    /// once they have a remote id. `None` means the folder exists
    /// locally only and cannot be diffed yet.
    pub fn selector(&self) -> Option<FolderSelector> {
        match self.local_id {
            LocalFolderId::UNREAD => Some(FolderSelector::Unread),
            LocalFolderId::ARCHIVE => Some(FolderSelector::Archive),
            _ => self.remote_id.map(FolderSelector::Folder),
        }
    }

    /// Returns true for the two permanent well-known folders.
    pub fn is_well_known(&self) -> bool {
        self.local_id.is_well_known()
    }
}

/// An article as the local store holds it.
///
/// An article belongs to at most one folder at a time (tracked by the
/// store, not on this struct); the liked flag is independent of folder
/// membership.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Identity, shared with the service once synced.
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
    /// Opaque service-assigned fingerprint. Never computed locally.
    pub hash: String,
    /// Whether the article is liked.
    pub liked: bool,
}

impl Article {
    /// Builds the fingerprint for this article.
    ///
    /// An article with an empty stored hash degrades to the id-only
    /// form; a blank hash would fail fingerprint validation.
    pub fn fingerprint(&self) -> Result<HaveStatus, ProtocolError> {
        if self.hash.trim().is_empty() {
            HaveStatus::new(self.id)
        } else {
            HaveStatus::with_progress(
                self.id,
                self.hash.clone(),
                self.read_progress,
                self.progress_timestamp,
            )
        }
    }
}

impl From<RemoteBookmark> for Article {
    fn from(remote: RemoteBookmark) -> Self {
        Self {
            id: remote.id,
            title: remote.title,
            url: remote.url,
            description: remote.description,
            read_progress: remote.read_progress,
            progress_timestamp: remote.progress_timestamp,
            hash: remote.hash,
            liked: remote.liked,
        }
    }
}

/// A folder added locally and not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFolderAdd {
    /// Local id of the folder awaiting upload.
    pub folder: LocalFolderId,
    /// Title to create on the service.
    pub title: String,
}

/// A synced folder deleted locally and not yet deleted remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFolderDelete {
    /// Remote id of the deleted folder.
    pub remote_id: RemoteFolderId,
}

/// An article saved locally and not yet uploaded. Keyed by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArticleAdd {
    /// URL to save on the service.
    pub url: String,
}

/// An article deleted locally and not yet deleted remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingArticleDelete {
    /// Id of the deleted article.
    pub id: BookmarkId,
}

/// An article moved locally and not yet moved remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingArticleMove {
    /// Article being moved.
    pub article: BookmarkId,
    /// Local id of the destination folder.
    pub destination: LocalFolderId,
}

/// A like/unlike applied locally and not yet applied remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLikeChange {
    /// Article whose like state changed.
    pub article: BookmarkId,
    /// The state the article was moved to locally.
    pub liked: bool,
}
