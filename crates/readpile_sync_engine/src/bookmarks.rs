//! Article reconciliation.

use readpile_sync_protocol::{
    FolderSelector, HaveStatus, ProtocolError, RemoteBookmark, RemoteError, RemoteResult,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::folders::FolderCoordinator;
use crate::model::{Article, Folder, PendingArticleMove};
use crate::remote::BookmarkClient;
use crate::store::{ArticleChangeStore, ArticleStore, FolderStore};

/// Reconciles article state with the service.
///
/// Runs after folder reconciliation so moves resolve against stable
/// remote folder ids. Sub-phases are strictly ordered: pending adds,
/// pending deletes, pending moves, per-folder fingerprint diff-sync,
/// pending like changes, liked-collection reconciliation.
///
/// A remote not-found is recoverable in every phase: it maps to a
/// local orphaning or a no-op. Any other remote failure aborts the
/// phase, leaving its undrained pending rows for the next pass.
pub struct BookmarkCoordinator {
    articles: Arc<dyn ArticleStore>,
    changes: Arc<dyn ArticleChangeStore>,
    folders: Arc<dyn FolderStore>,
    folder_sync: Arc<FolderCoordinator>,
    client: Arc<dyn BookmarkClient>,
    config: SyncConfig,
}

impl BookmarkCoordinator {
    /// Creates a coordinator over the given collaborators.
    ///
    /// `folder_sync` is the peer coordinator; the move phase borrows
    /// its single-folder upload when a destination folder has never
    /// been pushed to the service.
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        changes: Arc<dyn ArticleChangeStore>,
        folders: Arc<dyn FolderStore>,
        folder_sync: Arc<FolderCoordinator>,
        client: Arc<dyn BookmarkClient>,
        config: SyncConfig,
    ) -> Self {
        Self {
            articles,
            changes,
            folders,
            folder_sync,
            client,
            config,
        }
    }

    /// Runs a full article reconciliation.
    pub async fn sync_bookmarks(&self) -> SyncResult<()> {
        self.drain_pending_adds().await?;
        self.drain_pending_deletes().await?;
        self.drain_pending_moves().await?;
        self.diff_sync_folders().await?;
        self.drain_pending_like_changes().await?;
        self.reconcile_liked().await
    }

    async fn drain_pending_adds(&self) -> SyncResult<()> {
        for pending in self.changes.pending_adds().await? {
            self.client
                .add(&pending.url)
                .await
                .map_err(SyncError::from)?;
            self.changes.remove_add(&pending.url).await?;
            debug!(url = %pending.url, "uploaded pending article add");
        }
        Ok(())
    }

    async fn drain_pending_deletes(&self) -> SyncResult<()> {
        for pending in self.changes.pending_deletes().await? {
            match self.client.delete(pending.id).await {
                Ok(()) => {}
                // Already gone remotely; the delete is satisfied.
                Err(RemoteError::NotFound) => {
                    debug!(article = %pending.id, "article already deleted on the service");
                }
                Err(err) => return Err(err.into()),
            }
            self.changes.remove_delete(pending.id).await?;
        }
        Ok(())
    }

    async fn drain_pending_moves(&self) -> SyncResult<()> {
        for pending in self.changes.pending_moves().await? {
            self.apply_pending_move(&pending).await?;
        }
        Ok(())
    }

    async fn apply_pending_move(&self, pending: &PendingArticleMove) -> SyncResult<()> {
        let Some(destination) = self.folders.by_local_id(pending.destination).await? else {
            warn!(article = %pending.article, folder = %pending.destination,
                "pending move targets a missing folder, dropping");
            return self.changes.remove_move(pending.article).await.map_err(Into::into);
        };
        let Some(article) = self.articles.get(pending.article).await? else {
            warn!(article = %pending.article, "pending move for a missing article, dropping");
            return self.changes.remove_move(pending.article).await.map_err(Into::into);
        };

        // A destination the service has never seen must be uploaded
        // first; if that fails the move stays queued for the next pass.
        let destination = if destination.selector().is_none() {
            match self.folder_sync.push_local_folder(destination.local_id).await {
                Ok(folder) => folder,
                Err(err) => {
                    warn!(folder = %pending.destination, error = %err,
                        "destination folder upload failed, retrying move next pass");
                    return Ok(());
                }
            }
        } else {
            destination
        };

        match self.dispatch_move(&article, &destination).await {
            Ok(remote) => {
                if remote.id == article.id {
                    self.articles.update(&Article::from(remote)).await?;
                } else {
                    // The service no longer had the bookmark and
                    // recreated it under a fresh identity on the unread
                    // add path. Replace the old row.
                    debug!(old = %article.id, new = %remote.id, "article recreated under new identity");
                    self.articles.delete(article.id).await?;
                    self.articles
                        .add_to_folder(Article::from(remote), destination.local_id)
                        .await?;
                }
            }
            Err(RemoteError::NotFound) => {
                self.articles.remove_from_folders(article.id).await?;
                debug!(article = %article.id, "move target gone remotely, orphaned locally");
            }
            Err(err) => return Err(err.into()),
        }
        self.changes.remove_move(pending.article).await?;
        Ok(())
    }

    async fn dispatch_move(
        &self,
        article: &Article,
        destination: &Folder,
    ) -> RemoteResult<RemoteBookmark> {
        match destination.selector() {
            // The service has no direct move-to-unread; re-saving the
            // URL is the equivalent.
            Some(FolderSelector::Unread) => self.client.add(&article.url).await,
            Some(FolderSelector::Archive) => self.client.archive(article.id).await,
            Some(FolderSelector::Folder(remote_id)) => {
                self.client.move_to(article.id, remote_id).await
            }
            Some(FolderSelector::Liked) | None => Err(RemoteError::service(
                0,
                format!("folder {} is not a move destination", destination.local_id),
            )),
        }
    }

    async fn diff_sync_folders(&self) -> SyncResult<()> {
        for folder in self.folders.list().await? {
            // Local-only folders cannot be diffed until uploaded.
            let Some(selector) = folder.selector() else {
                continue;
            };
            self.diff_sync_folder(&folder, selector).await?;
        }
        Ok(())
    }

    async fn diff_sync_folder(&self, folder: &Folder, selector: FolderSelector) -> SyncResult<()> {
        let local = self.articles.list_in_folder(folder.local_id).await?;
        let haves = fingerprints(&local)?;
        let diff = match self
            .client
            .list(selector, &haves, self.config.per_folder_limit)
            .await
        {
            Ok(diff) => diff,
            // The folder itself vanished remotely; folder sync owns its
            // deletion, this pass just skips it.
            Err(RemoteError::NotFound) => {
                debug!(folder = %folder.local_id, "folder gone remotely, skipping diff");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for id in diff.deleted {
            // Keep the article row: a later phase may move it elsewhere
            // or orphan cleanup will confirm it stale.
            self.articles.remove_from_folders(id).await?;
            debug!(article = %id, folder = %folder.local_id, "removed from folder per diff");
        }
        for remote in diff.updates {
            let article = Article::from(remote);
            match self.articles.get(article.id).await? {
                None => {
                    self.articles
                        .add_to_folder(article, folder.local_id)
                        .await?;
                }
                Some(_) => {
                    self.articles
                        .move_to_folder(article.id, folder.local_id)
                        .await?;
                    self.articles.update(&article).await?;
                }
            }
        }
        Ok(())
    }

    async fn drain_pending_like_changes(&self) -> SyncResult<()> {
        for pending in self.changes.pending_like_changes().await? {
            let call = if pending.liked {
                self.client.like(pending.article).await
            } else {
                self.client.unlike(pending.article).await
            };
            match call {
                Ok(remote) => {
                    if self.articles.get(pending.article).await?.is_some() {
                        self.articles.update(&Article::from(remote)).await?;
                    }
                }
                // Gone remotely; local state is left for orphan cleanup.
                Err(RemoteError::NotFound) => {
                    debug!(article = %pending.article, "like target gone remotely, dropping");
                }
                Err(err) => return Err(err.into()),
            }
            self.changes.remove_like_change(pending.article).await?;
        }
        Ok(())
    }

    async fn reconcile_liked(&self) -> SyncResult<()> {
        let liked = self.articles.list_liked().await?;
        let haves = fingerprints(&liked)?;
        let diff = match self
            .client
            .list(FolderSelector::Liked, &haves, self.config.per_folder_limit)
            .await
        {
            Ok(diff) => diff,
            Err(RemoteError::NotFound) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        for id in diff.deleted {
            if self.articles.get(id).await?.is_some() {
                // No longer liked on the service; folder membership is
                // not required for this.
                self.articles.set_liked(id, false).await?;
            }
        }
        for remote in diff.updates {
            match self.articles.get(remote.id).await? {
                Some(_) => self.articles.set_liked(remote.id, true).await?,
                // Liked but unknown locally: keep it folder-less until a
                // folder sync or cleanup resolves it.
                None => self.articles.add_orphaned(Article::from(remote)).await?,
            }
        }
        Ok(())
    }
}

fn fingerprints(articles: &[Article]) -> Result<Vec<HaveStatus>, ProtocolError> {
    articles.iter().map(Article::fingerprint).collect()
}
