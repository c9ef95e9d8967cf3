//! Remote service seams.
//!
//! The coordinators talk to the bookmarking service only through these
//! traits; the HTTP client implementing them against the real wire
//! format lives outside this crate. [`MemoryRemote`] is a scripted
//! in-memory service for tests, including server-side diff computation
//! against supplied fingerprints.

use async_trait::async_trait;
use parking_lot::RwLock;
use readpile_sync_protocol::{
    BookmarkDiff, BookmarkId, FolderSelector, HaveStatus, RemoteBookmark, RemoteError,
    RemoteFolder, RemoteFolderId, RemoteResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Folder operations on the service.
#[async_trait]
pub trait FolderClient: Send + Sync {
    /// Lists every folder on the account.
    async fn list(&self) -> RemoteResult<Vec<RemoteFolder>>;

    /// Creates a folder. Fails with [`RemoteError::DuplicateTitle`]
    /// when the title is already taken.
    async fn add(&self, title: &str) -> RemoteResult<RemoteFolder>;

    /// Deletes a folder. Fails with [`RemoteError::NotFound`] when the
    /// folder is already gone.
    async fn delete(&self, id: RemoteFolderId) -> RemoteResult<()>;
}

/// Bookmark operations on the service.
#[async_trait]
pub trait BookmarkClient: Send + Sync {
    /// Saves a URL. Re-saving a URL the service already has returns the
    /// existing bookmark moved back to unread; a URL it no longer has
    /// is recreated under a fresh identity.
    async fn add(&self, url: &str) -> RemoteResult<RemoteBookmark>;

    /// Deletes a bookmark.
    async fn delete(&self, id: BookmarkId) -> RemoteResult<()>;

    /// Moves a bookmark to the archive.
    async fn archive(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark>;

    /// Moves a bookmark into a user folder.
    async fn move_to(&self, id: BookmarkId, folder: RemoteFolderId)
        -> RemoteResult<RemoteBookmark>;

    /// Marks a bookmark liked.
    async fn like(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark>;

    /// Clears a bookmark's liked mark.
    async fn unlike(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark>;

    /// Diff-sync listing: what changed in `folder` relative to the
    /// supplied fingerprints, bounded by `limit`.
    async fn list(
        &self,
        folder: FolderSelector,
        haves: &[HaveStatus],
        limit: u32,
    ) -> RemoteResult<BookmarkDiff>;
}

/// Where a bookmark lives on the service. Liked is not a placement; it
/// is a flag on the bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Unread,
    Archive,
    Folder(RemoteFolderId),
}

#[derive(Debug, Default)]
struct ServiceState {
    folders: Vec<RemoteFolder>,
    next_folder_id: u64,
    next_position: i64,
    bookmarks: HashMap<BookmarkId, RemoteBookmark>,
    placements: HashMap<BookmarkId, Placement>,
    next_bookmark_id: u64,
    next_hash: u64,
}

/// An in-memory bookmarking service.
///
/// Implements both client traits with the service-side semantics the
/// coordinators rely on: duplicate-title folder creates, idempotent
/// saves by URL, fresh identities for re-saved URLs the service no
/// longer has, and fingerprint diffs. `set_offline(true)` makes every
/// call fail with a transport error, for testing the abort-and-retry
/// path.
#[derive(Debug)]
pub struct MemoryRemote {
    state: RwLock<ServiceState>,
    offline: AtomicBool,
}

impl MemoryRemote {
    /// Creates an empty service.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ServiceState {
                next_folder_id: 100,
                next_position: 1,
                next_bookmark_id: 1,
                next_hash: 1,
                ..ServiceState::default()
            }),
            offline: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seeds a folder directly on the service.
    pub fn seed_folder(&self, title: impl Into<String>) -> RemoteFolder {
        let mut state = self.state.write();
        Self::create_folder(&mut state, title.into())
    }

    /// Seeds a bookmark directly on the service. `selector` must not be
    /// [`FolderSelector::Liked`]; use [`MemoryRemote::mark_liked`].
    pub fn seed_bookmark(&self, url: impl Into<String>, selector: FolderSelector) -> RemoteBookmark {
        let placement = match selector {
            FolderSelector::Unread => Placement::Unread,
            FolderSelector::Archive => Placement::Archive,
            FolderSelector::Folder(id) => Placement::Folder(id),
            FolderSelector::Liked => panic!("liked is a flag, not a placement"),
        };
        let mut state = self.state.write();
        Self::create_bookmark(&mut state, url.into(), placement)
    }

    /// Flags a seeded bookmark liked.
    pub fn mark_liked(&self, id: BookmarkId) {
        if let Some(bookmark) = self.state.write().bookmarks.get_mut(&id) {
            bookmark.liked = true;
        }
    }

    /// Applies a service-side progress change, assigning a fresh hash.
    pub fn set_progress(&self, id: BookmarkId, progress: f64, timestamp: i64) {
        let mut state = self.state.write();
        let hash = Self::fresh_hash(&mut state.next_hash);
        if let Some(bookmark) = state.bookmarks.get_mut(&id) {
            bookmark.read_progress = progress;
            bookmark.progress_timestamp = timestamp;
            bookmark.hash = hash;
        }
    }

    /// Looks a folder up by title.
    pub fn folder_by_title(&self, title: &str) -> Option<RemoteFolder> {
        self.state
            .read()
            .folders
            .iter()
            .find(|f| f.title == title)
            .cloned()
    }

    /// Lists the bookmarks currently placed in `selector`.
    pub fn bookmarks_in(&self, selector: FolderSelector) -> Vec<RemoteBookmark> {
        let state = self.state.read();
        Self::members(&state, selector)
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::transport("service unreachable"))
        } else {
            Ok(())
        }
    }

    fn fresh_hash(next_hash: &mut u64) -> String {
        let hash = format!("srv{next_hash:06}");
        *next_hash += 1;
        hash
    }

    fn create_folder(state: &mut ServiceState, title: String) -> RemoteFolder {
        let folder = RemoteFolder {
            id: RemoteFolderId::new(state.next_folder_id),
            title,
            position: state.next_position,
            should_sync: true,
        };
        state.next_folder_id += 1;
        state.next_position += 1;
        state.folders.push(folder.clone());
        folder
    }

    fn create_bookmark(
        state: &mut ServiceState,
        url: String,
        placement: Placement,
    ) -> RemoteBookmark {
        let hash = Self::fresh_hash(&mut state.next_hash);
        let bookmark = RemoteBookmark {
            id: BookmarkId::new(state.next_bookmark_id),
            title: url.clone(),
            url,
            description: String::new(),
            read_progress: 0.0,
            progress_timestamp: 0,
            hash,
            liked: false,
        };
        state.next_bookmark_id += 1;
        state.placements.insert(bookmark.id, placement);
        state.bookmarks.insert(bookmark.id, bookmark.clone());
        bookmark
    }

    fn members(state: &ServiceState, selector: FolderSelector) -> Vec<RemoteBookmark> {
        let mut members: Vec<RemoteBookmark> = match selector {
            FolderSelector::Liked => state
                .bookmarks
                .values()
                .filter(|b| b.liked)
                .cloned()
                .collect(),
            FolderSelector::Unread => Self::placed(state, Placement::Unread),
            FolderSelector::Archive => Self::placed(state, Placement::Archive),
            FolderSelector::Folder(id) => Self::placed(state, Placement::Folder(id)),
        };
        members.sort_by_key(|b| b.id);
        members
    }

    fn placed(state: &ServiceState, placement: Placement) -> Vec<RemoteBookmark> {
        state
            .placements
            .iter()
            .filter(|(_, p)| **p == placement)
            .filter_map(|(id, _)| state.bookmarks.get(id).cloned())
            .collect()
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FolderClient for MemoryRemote {
    async fn list(&self) -> RemoteResult<Vec<RemoteFolder>> {
        self.check_online()?;
        Ok(self.state.read().folders.clone())
    }

    async fn add(&self, title: &str) -> RemoteResult<RemoteFolder> {
        self.check_online()?;
        let mut state = self.state.write();
        if state.folders.iter().any(|f| f.title == title) {
            return Err(RemoteError::DuplicateTitle);
        }
        Ok(Self::create_folder(&mut state, title.into()))
    }

    async fn delete(&self, id: RemoteFolderId) -> RemoteResult<()> {
        self.check_online()?;
        let mut state = self.state.write();
        if !state.folders.iter().any(|f| f.id == id) {
            return Err(RemoteError::NotFound);
        }
        state.folders.retain(|f| f.id != id);
        // The service moves a deleted folder's bookmarks to the archive.
        for placement in state.placements.values_mut() {
            if *placement == Placement::Folder(id) {
                *placement = Placement::Archive;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkClient for MemoryRemote {
    async fn add(&self, url: &str) -> RemoteResult<RemoteBookmark> {
        self.check_online()?;
        let mut state = self.state.write();
        let existing = state
            .bookmarks
            .values()
            .find(|b| b.url == url)
            .map(|b| b.id);
        if let Some(id) = existing {
            state.placements.insert(id, Placement::Unread);
            return Ok(state.bookmarks[&id].clone());
        }
        Ok(Self::create_bookmark(&mut state, url.into(), Placement::Unread))
    }

    async fn delete(&self, id: BookmarkId) -> RemoteResult<()> {
        self.check_online()?;
        let mut state = self.state.write();
        if state.bookmarks.remove(&id).is_none() {
            return Err(RemoteError::NotFound);
        }
        state.placements.remove(&id);
        Ok(())
    }

    async fn archive(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark> {
        self.check_online()?;
        let mut state = self.state.write();
        if !state.bookmarks.contains_key(&id) {
            return Err(RemoteError::NotFound);
        }
        state.placements.insert(id, Placement::Archive);
        Ok(state.bookmarks[&id].clone())
    }

    async fn move_to(
        &self,
        id: BookmarkId,
        folder: RemoteFolderId,
    ) -> RemoteResult<RemoteBookmark> {
        self.check_online()?;
        let mut state = self.state.write();
        if !state.bookmarks.contains_key(&id) || !state.folders.iter().any(|f| f.id == folder) {
            return Err(RemoteError::NotFound);
        }
        state.placements.insert(id, Placement::Folder(folder));
        Ok(state.bookmarks[&id].clone())
    }

    async fn like(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark> {
        self.check_online()?;
        let mut state = self.state.write();
        let bookmark = state.bookmarks.get_mut(&id).ok_or(RemoteError::NotFound)?;
        bookmark.liked = true;
        Ok(bookmark.clone())
    }

    async fn unlike(&self, id: BookmarkId) -> RemoteResult<RemoteBookmark> {
        self.check_online()?;
        let mut state = self.state.write();
        let bookmark = state.bookmarks.get_mut(&id).ok_or(RemoteError::NotFound)?;
        bookmark.liked = false;
        Ok(bookmark.clone())
    }

    async fn list(
        &self,
        folder: FolderSelector,
        haves: &[HaveStatus],
        limit: u32,
    ) -> RemoteResult<BookmarkDiff> {
        self.check_online()?;
        let state = self.state.read();
        if let FolderSelector::Folder(id) = folder {
            if !state.folders.iter().any(|f| f.id == id) {
                return Err(RemoteError::NotFound);
            }
        }
        let members = Self::members(&state, folder);
        let known: HashMap<BookmarkId, &HaveStatus> =
            haves.iter().map(|h| (h.id(), h)).collect();

        // The limit bounds the listing window; deletions are judged
        // against the full member set so a fingerprint past the window
        // is not misreported as gone.
        let updates = members
            .iter()
            .take(limit as usize)
            .filter(|b| {
                known
                    .get(&b.id)
                    .is_none_or(|h| h.hash() != Some(b.hash.as_str()))
            })
            .cloned()
            .collect();
        let deleted = haves
            .iter()
            .map(|h| h.id())
            .filter(|id| !members.iter().any(|b| b.id == *id))
            .collect();
        Ok(BookmarkDiff { updates, deleted })
    }
}
