//! Full-sync orchestration.

use std::sync::Arc;
use tracing::info;

use crate::bookmarks::BookmarkCoordinator;
use crate::cleanup::OrphanCollector;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::events::{EventFeed, SyncEvent};
use crate::folders::FolderCoordinator;
use crate::remote::{BookmarkClient, FolderClient};
use crate::store::{ArticleChangeStore, ArticleStore, FolderChangeStore, FolderStore};

/// Sequences a full sync: folders, then articles, then orphan cleanup.
///
/// Phases run strictly in that order with no parallelism between them;
/// the first unrecovered error aborts the remaining phases. The
/// coordinators are peers owned here; the article coordinator holds a
/// reference to the folder coordinator for the single-folder upload its
/// move path needs.
pub struct SyncOrchestrator {
    folders: Arc<FolderCoordinator>,
    bookmarks: BookmarkCoordinator,
    cleanup: OrphanCollector,
    events: Arc<EventFeed<SyncEvent>>,
}

impl SyncOrchestrator {
    /// Wires the coordinators over the given collaborators.
    ///
    /// `events` is shared so subscribers outlive individual orchestrator
    /// instances; a fresh orchestrator is typically built per sync run
    /// over an isolated store connection.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        folder_store: Arc<dyn FolderStore>,
        folder_changes: Arc<dyn FolderChangeStore>,
        article_store: Arc<dyn ArticleStore>,
        article_changes: Arc<dyn ArticleChangeStore>,
        folder_client: Arc<dyn FolderClient>,
        bookmark_client: Arc<dyn BookmarkClient>,
        events: Arc<EventFeed<SyncEvent>>,
        config: SyncConfig,
    ) -> Self {
        let folders = Arc::new(FolderCoordinator::new(
            Arc::clone(&folder_store),
            folder_changes,
            folder_client,
        ));
        let bookmarks = BookmarkCoordinator::new(
            Arc::clone(&article_store),
            article_changes,
            folder_store,
            Arc::clone(&folders),
            bookmark_client,
            config.clone(),
        );
        let cleanup = OrphanCollector::new(article_store, config);
        Self {
            folders,
            bookmarks,
            cleanup,
            events,
        }
    }

    /// Runs the full sync.
    ///
    /// `SyncEnded` is raised on every exit path; the phase-ended events
    /// only when their phase succeeds.
    pub async fn sync_everything(&self) -> SyncResult<()> {
        self.events.emit(SyncEvent::SyncStarted);
        let result = self.run_phases().await;
        self.events.emit(SyncEvent::SyncEnded);
        result
    }

    async fn run_phases(&self) -> SyncResult<()> {
        info!("starting full sync");

        self.events.emit(SyncEvent::FoldersStarted);
        self.folders.sync_folders().await?;
        self.events.emit(SyncEvent::FoldersEnded);

        self.events.emit(SyncEvent::ArticlesStarted);
        self.bookmarks.sync_bookmarks().await?;
        self.events.emit(SyncEvent::ArticlesEnded);

        self.cleanup.cleanup_orphaned_articles().await?;

        info!("full sync complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryArticleChanges, MemoryFolderChanges, MemoryStore};
    use crate::remote::MemoryRemote;

    fn orchestrator(
        store: &Arc<MemoryStore>,
        remote: &Arc<MemoryRemote>,
        events: &Arc<EventFeed<SyncEvent>>,
    ) -> SyncOrchestrator {
        SyncOrchestrator::new(
            Arc::clone(store) as Arc<dyn FolderStore>,
            Arc::new(MemoryFolderChanges::new()),
            Arc::clone(store) as Arc<dyn ArticleStore>,
            Arc::new(MemoryArticleChanges::new()),
            Arc::clone(remote) as Arc<dyn FolderClient>,
            Arc::clone(remote) as Arc<dyn BookmarkClient>,
            Arc::clone(events),
            SyncConfig::default(),
        )
    }

    #[tokio::test]
    async fn event_order_on_success() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryRemote::new());
        let events = Arc::new(EventFeed::new());
        let rx = events.subscribe();

        orchestrator(&store, &remote, &events)
            .sync_everything()
            .await
            .unwrap();

        let received: Vec<SyncEvent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SyncEvent::SyncStarted,
                SyncEvent::FoldersStarted,
                SyncEvent::FoldersEnded,
                SyncEvent::ArticlesStarted,
                SyncEvent::ArticlesEnded,
                SyncEvent::SyncEnded,
            ]
        );
    }

    #[tokio::test]
    async fn failure_still_raises_sync_ended() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryRemote::new());
        remote.set_offline(true);
        let events = Arc::new(EventFeed::new());
        let rx = events.subscribe();

        assert!(orchestrator(&store, &remote, &events)
            .sync_everything()
            .await
            .is_err());

        let received: Vec<SyncEvent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SyncEvent::SyncStarted,
                SyncEvent::FoldersStarted,
                SyncEvent::SyncEnded,
            ]
        );
    }
}
