//! Orphaned article cleanup.

use readpile_sync_protocol::BookmarkId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::store::ArticleStore;

/// Deletes articles that are in no folder and not liked.
///
/// Liked articles inside the per-folder sync window are intentionally
/// kept without a folder; they mirror the service's liked virtual
/// collection. Every other folder-less article is stale.
pub struct OrphanCollector {
    articles: Arc<dyn ArticleStore>,
    config: SyncConfig,
}

impl OrphanCollector {
    /// Creates a collector over the given article store.
    pub fn new(articles: Arc<dyn ArticleStore>, config: SyncConfig) -> Self {
        Self { articles, config }
    }

    /// Deletes every folder-less article outside the liked window.
    pub async fn cleanup_orphaned_articles(&self) -> SyncResult<()> {
        let keep: HashSet<BookmarkId> = self
            .articles
            .list_liked()
            .await?
            .into_iter()
            .take(self.config.per_folder_limit as usize)
            .map(|a| a.id)
            .collect();

        for article in self.articles.list_orphaned().await? {
            if !keep.contains(&article.id) {
                self.articles.delete(article.id).await?;
                debug!(article = %article.id, "deleted orphaned article");
            }
        }
        Ok(())
    }
}
