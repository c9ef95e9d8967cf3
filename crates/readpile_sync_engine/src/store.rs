//! Local store seams.
//!
//! The engine reaches local state only through these traits. The SQL
//! schema behind them is someone else's concern; the in-memory
//! implementations in [`crate::memory`] are the reference semantics.
//!
//! Every call is a suspension point: implementations are expected to be
//! backed by a database and may be slow.

use async_trait::async_trait;
use readpile_sync_protocol::{BookmarkId, RemoteFolderId};
use thiserror::Error;

use crate::model::{
    Article, Folder, LocalFolderId, PendingArticleAdd, PendingArticleDelete, PendingArticleMove,
    PendingFolderAdd, PendingFolderDelete, PendingLikeChange,
};

/// Result type for local store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A folder addressed by local id does not exist.
    #[error("folder {0} not found in the local store")]
    FolderMissing(LocalFolderId),

    /// An article addressed by id does not exist.
    #[error("article {0} not found in the local store")]
    ArticleMissing(BookmarkId),

    /// The storage backend failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Read/write access to locally stored folders.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Lists every folder, the well-known ones included.
    async fn list(&self) -> StoreResult<Vec<Folder>>;

    /// Looks a folder up by local id.
    async fn by_local_id(&self, id: LocalFolderId) -> StoreResult<Option<Folder>>;

    /// Looks a folder up by remote id.
    async fn by_remote_id(&self, id: RemoteFolderId) -> StoreResult<Option<Folder>>;

    /// Creates a folder already known to the service.
    async fn add_known(
        &self,
        title: &str,
        remote_id: RemoteFolderId,
        position: i64,
        should_sync: bool,
    ) -> StoreResult<Folder>;

    /// Overwrites a folder's fields, addressed by its local id.
    async fn update(&self, folder: &Folder) -> StoreResult<()>;

    /// Deletes a folder. Articles in it become folder-less.
    async fn delete(&self, id: LocalFolderId) -> StoreResult<()>;
}

/// Read/delete access to not-yet-uploaded folder mutations.
///
/// Rows are created by local mutation paths outside the sync core; the
/// coordinators only drain them.
#[async_trait]
pub trait FolderChangeStore: Send + Sync {
    /// Lists pending folder adds.
    async fn pending_adds(&self) -> StoreResult<Vec<PendingFolderAdd>>;

    /// Lists pending folder deletes.
    async fn pending_deletes(&self) -> StoreResult<Vec<PendingFolderDelete>>;

    /// Removes the pending add for a folder.
    async fn remove_add(&self, folder: LocalFolderId) -> StoreResult<()>;

    /// Removes the pending delete for a remote folder id.
    async fn remove_delete(&self, remote_id: RemoteFolderId) -> StoreResult<()>;
}

/// Read/write access to locally stored articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Lists the articles in a folder.
    async fn list_in_folder(&self, folder: LocalFolderId) -> StoreResult<Vec<Article>>;

    /// Looks an article up by id.
    async fn get(&self, id: BookmarkId) -> StoreResult<Option<Article>>;

    /// Inserts an article into a folder.
    async fn add_to_folder(&self, article: Article, folder: LocalFolderId) -> StoreResult<()>;

    /// Inserts an article with no folder association.
    async fn add_orphaned(&self, article: Article) -> StoreResult<()>;

    /// Moves an article into a folder. No-op if already there.
    async fn move_to_folder(&self, id: BookmarkId, folder: LocalFolderId) -> StoreResult<()>;

    /// Removes an article from whatever folder holds it, keeping the
    /// article row. No-op if already folder-less.
    async fn remove_from_folders(&self, id: BookmarkId) -> StoreResult<()>;

    /// Deletes an article row entirely.
    async fn delete(&self, id: BookmarkId) -> StoreResult<()>;

    /// Overwrites an article's stored fields. Folder membership is
    /// untouched.
    async fn update(&self, article: &Article) -> StoreResult<()>;

    /// Sets the liked flag.
    async fn set_liked(&self, id: BookmarkId, liked: bool) -> StoreResult<()>;

    /// Lists articles currently marked liked.
    async fn list_liked(&self) -> StoreResult<Vec<Article>>;

    /// Lists articles in no folder.
    async fn list_orphaned(&self) -> StoreResult<Vec<Article>>;
}

/// Read/delete access to not-yet-uploaded article mutations.
#[async_trait]
pub trait ArticleChangeStore: Send + Sync {
    /// Lists pending article adds.
    async fn pending_adds(&self) -> StoreResult<Vec<PendingArticleAdd>>;

    /// Lists pending article deletes.
    async fn pending_deletes(&self) -> StoreResult<Vec<PendingArticleDelete>>;

    /// Lists pending article moves.
    async fn pending_moves(&self) -> StoreResult<Vec<PendingArticleMove>>;

    /// Lists pending like-state changes.
    async fn pending_like_changes(&self) -> StoreResult<Vec<PendingLikeChange>>;

    /// Removes the pending add for a URL.
    async fn remove_add(&self, url: &str) -> StoreResult<()>;

    /// Removes the pending delete for an article.
    async fn remove_delete(&self, id: BookmarkId) -> StoreResult<()>;

    /// Removes the pending move for an article.
    async fn remove_move(&self, article: BookmarkId) -> StoreResult<()>;

    /// Removes the pending like-state change for an article.
    async fn remove_like_change(&self, article: BookmarkId) -> StoreResult<()>;
}
