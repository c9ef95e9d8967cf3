//! In-memory store implementations.
//!
//! Reference semantics for the seams in [`crate::store`], used by the
//! engine's own tests and usable as scaffolding by downstream crates.
//! Beyond the traits they expose seeding helpers that stand in for the
//! local mutation paths living outside the sync core.

use async_trait::async_trait;
use parking_lot::RwLock;
use readpile_sync_protocol::{BookmarkId, RemoteFolderId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{
    Article, Folder, LocalFolderId, PendingArticleAdd, PendingArticleDelete, PendingArticleMove,
    PendingFolderAdd, PendingFolderDelete, PendingLikeChange,
};
use crate::store::{
    ArticleChangeStore, ArticleStore, FolderChangeStore, FolderStore, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct StoreState {
    folders: Vec<Folder>,
    next_folder_id: i64,
    articles: HashMap<BookmarkId, Article>,
    memberships: HashMap<BookmarkId, LocalFolderId>,
}

/// An in-memory folder and article store.
///
/// Folders and articles share one state so referential actions hold:
/// deleting a folder orphans its articles, exactly as the SQL store's
/// foreign-key actions would.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    mutations: AtomicU64,
}

impl MemoryStore {
    /// Creates a store seeded with the permanent well-known folders.
    pub fn new() -> Self {
        let folders = vec![
            Folder {
                local_id: LocalFolderId::UNREAD,
                remote_id: None,
                title: "Unread".into(),
                position: 0,
                should_sync: true,
            },
            Folder {
                local_id: LocalFolderId::ARCHIVE,
                remote_id: None,
                title: "Archive".into(),
                position: 0,
                should_sync: true,
            },
        ];
        Self {
            state: RwLock::new(StoreState {
                folders,
                next_folder_id: LocalFolderId::FIRST_USER,
                articles: HashMap::new(),
                memberships: HashMap::new(),
            }),
            mutations: AtomicU64::new(0),
        }
    }

    /// Seeds a local-only folder, as a local add outside the sync core
    /// would. The folder has no remote id until a sync uploads it.
    pub fn insert_local_folder(&self, title: impl Into<String>) -> Folder {
        let mut state = self.state.write();
        let folder = Folder {
            local_id: LocalFolderId::new(state.next_folder_id),
            remote_id: None,
            title: title.into(),
            position: 0,
            should_sync: true,
        };
        state.next_folder_id += 1;
        state.folders.push(folder.clone());
        folder
    }

    /// Number of mutating store calls performed so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Folder>> {
        Ok(self.state.read().folders.clone())
    }

    async fn by_local_id(&self, id: LocalFolderId) -> StoreResult<Option<Folder>> {
        Ok(self
            .state
            .read()
            .folders
            .iter()
            .find(|f| f.local_id == id)
            .cloned())
    }

    async fn by_remote_id(&self, id: RemoteFolderId) -> StoreResult<Option<Folder>> {
        Ok(self
            .state
            .read()
            .folders
            .iter()
            .find(|f| f.remote_id == Some(id))
            .cloned())
    }

    async fn add_known(
        &self,
        title: &str,
        remote_id: RemoteFolderId,
        position: i64,
        should_sync: bool,
    ) -> StoreResult<Folder> {
        self.touch();
        let mut state = self.state.write();
        let folder = Folder {
            local_id: LocalFolderId::new(state.next_folder_id),
            remote_id: Some(remote_id),
            title: title.into(),
            position,
            should_sync,
        };
        state.next_folder_id += 1;
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn update(&self, folder: &Folder) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        let slot = state
            .folders
            .iter_mut()
            .find(|f| f.local_id == folder.local_id)
            .ok_or(StoreError::FolderMissing(folder.local_id))?;
        *slot = folder.clone();
        Ok(())
    }

    async fn delete(&self, id: LocalFolderId) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        state.folders.retain(|f| f.local_id != id);
        state.memberships.retain(|_, folder| *folder != id);
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn list_in_folder(&self, folder: LocalFolderId) -> StoreResult<Vec<Article>> {
        let state = self.state.read();
        Ok(state
            .memberships
            .iter()
            .filter(|(_, f)| **f == folder)
            .filter_map(|(id, _)| state.articles.get(id).cloned())
            .collect())
    }

    async fn get(&self, id: BookmarkId) -> StoreResult<Option<Article>> {
        Ok(self.state.read().articles.get(&id).cloned())
    }

    async fn add_to_folder(&self, article: Article, folder: LocalFolderId) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        if !state.folders.iter().any(|f| f.local_id == folder) {
            return Err(StoreError::FolderMissing(folder));
        }
        state.memberships.insert(article.id, folder);
        state.articles.insert(article.id, article);
        Ok(())
    }

    async fn add_orphaned(&self, article: Article) -> StoreResult<()> {
        self.touch();
        self.state.write().articles.insert(article.id, article);
        Ok(())
    }

    async fn move_to_folder(&self, id: BookmarkId, folder: LocalFolderId) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        if !state.articles.contains_key(&id) {
            return Err(StoreError::ArticleMissing(id));
        }
        if !state.folders.iter().any(|f| f.local_id == folder) {
            return Err(StoreError::FolderMissing(folder));
        }
        state.memberships.insert(id, folder);
        Ok(())
    }

    async fn remove_from_folders(&self, id: BookmarkId) -> StoreResult<()> {
        self.touch();
        self.state.write().memberships.remove(&id);
        Ok(())
    }

    async fn delete(&self, id: BookmarkId) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        state.articles.remove(&id);
        state.memberships.remove(&id);
        Ok(())
    }

    async fn update(&self, article: &Article) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        let slot = state
            .articles
            .get_mut(&article.id)
            .ok_or(StoreError::ArticleMissing(article.id))?;
        *slot = article.clone();
        Ok(())
    }

    async fn set_liked(&self, id: BookmarkId, liked: bool) -> StoreResult<()> {
        self.touch();
        let mut state = self.state.write();
        let article = state
            .articles
            .get_mut(&id)
            .ok_or(StoreError::ArticleMissing(id))?;
        article.liked = liked;
        Ok(())
    }

    async fn list_liked(&self) -> StoreResult<Vec<Article>> {
        Ok(self
            .state
            .read()
            .articles
            .values()
            .filter(|a| a.liked)
            .cloned()
            .collect())
    }

    async fn list_orphaned(&self) -> StoreResult<Vec<Article>> {
        let state = self.state.read();
        Ok(state
            .articles
            .values()
            .filter(|a| !state.memberships.contains_key(&a.id))
            .cloned()
            .collect())
    }
}

/// In-memory queue of pending folder mutations.
#[derive(Debug, Default)]
pub struct MemoryFolderChanges {
    adds: RwLock<Vec<PendingFolderAdd>>,
    deletes: RwLock<Vec<PendingFolderDelete>>,
}

impl MemoryFolderChanges {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pending folder add.
    pub fn push_add(&self, pending: PendingFolderAdd) {
        self.adds.write().push(pending);
    }

    /// Queues a pending folder delete.
    pub fn push_delete(&self, pending: PendingFolderDelete) {
        self.deletes.write().push(pending);
    }

    /// Returns true once every queue is empty.
    pub fn is_drained(&self) -> bool {
        self.adds.read().is_empty() && self.deletes.read().is_empty()
    }
}

#[async_trait]
impl FolderChangeStore for MemoryFolderChanges {
    async fn pending_adds(&self) -> StoreResult<Vec<PendingFolderAdd>> {
        Ok(self.adds.read().clone())
    }

    async fn pending_deletes(&self) -> StoreResult<Vec<PendingFolderDelete>> {
        Ok(self.deletes.read().clone())
    }

    async fn remove_add(&self, folder: LocalFolderId) -> StoreResult<()> {
        self.adds.write().retain(|p| p.folder != folder);
        Ok(())
    }

    async fn remove_delete(&self, remote_id: RemoteFolderId) -> StoreResult<()> {
        self.deletes.write().retain(|p| p.remote_id != remote_id);
        Ok(())
    }
}

/// In-memory queue of pending article mutations.
#[derive(Debug, Default)]
pub struct MemoryArticleChanges {
    adds: RwLock<Vec<PendingArticleAdd>>,
    deletes: RwLock<Vec<PendingArticleDelete>>,
    moves: RwLock<Vec<PendingArticleMove>>,
    like_changes: RwLock<Vec<PendingLikeChange>>,
}

impl MemoryArticleChanges {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pending article add.
    pub fn push_add(&self, pending: PendingArticleAdd) {
        self.adds.write().push(pending);
    }

    /// Queues a pending article delete.
    pub fn push_delete(&self, pending: PendingArticleDelete) {
        self.deletes.write().push(pending);
    }

    /// Queues a pending article move.
    pub fn push_move(&self, pending: PendingArticleMove) {
        self.moves.write().push(pending);
    }

    /// Queues a pending like-state change.
    pub fn push_like_change(&self, pending: PendingLikeChange) {
        self.like_changes.write().push(pending);
    }

    /// Returns true once every queue is empty.
    pub fn is_drained(&self) -> bool {
        self.adds.read().is_empty()
            && self.deletes.read().is_empty()
            && self.moves.read().is_empty()
            && self.like_changes.read().is_empty()
    }
}

#[async_trait]
impl ArticleChangeStore for MemoryArticleChanges {
    async fn pending_adds(&self) -> StoreResult<Vec<PendingArticleAdd>> {
        Ok(self.adds.read().clone())
    }

    async fn pending_deletes(&self) -> StoreResult<Vec<PendingArticleDelete>> {
        Ok(self.deletes.read().clone())
    }

    async fn pending_moves(&self) -> StoreResult<Vec<PendingArticleMove>> {
        Ok(self.moves.read().clone())
    }

    async fn pending_like_changes(&self) -> StoreResult<Vec<PendingLikeChange>> {
        Ok(self.like_changes.read().clone())
    }

    async fn remove_add(&self, url: &str) -> StoreResult<()> {
        self.adds.write().retain(|p| p.url != url);
        Ok(())
    }

    async fn remove_delete(&self, id: BookmarkId) -> StoreResult<()> {
        self.deletes.write().retain(|p| p.id != id);
        Ok(())
    }

    async fn remove_move(&self, article: BookmarkId) -> StoreResult<()> {
        self.moves.write().retain(|p| p.article != article);
        Ok(())
    }

    async fn remove_like_change(&self, article: BookmarkId) -> StoreResult<()> {
        self.like_changes.write().retain(|p| p.article != article);
        Ok(())
    }
}
