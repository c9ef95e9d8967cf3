//! End-to-end sync scenarios over memory stores and the in-memory
//! service.

use async_trait::async_trait;
use readpile_sync_engine::{
    Article, ArticleChangeStore, ArticleStore, BookmarkClient, ContentDownloader, EventFeed,
    FolderChangeStore, FolderClient, FolderStore, LocalFolderId, MemoryArticleChanges,
    MemoryFolderChanges, MemoryRemote, MemoryStore, PendingArticleAdd, PendingArticleMove,
    PendingFolderAdd, PendingLikeChange, SyncConfig, SyncEvent, SyncHandle, SyncHandleFactory,
    SyncOrchestrator, SyncResult, SyncSession,
};
use readpile_sync_protocol::{BookmarkId, FolderSelector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct World {
    store: Arc<MemoryStore>,
    folder_changes: Arc<MemoryFolderChanges>,
    article_changes: Arc<MemoryArticleChanges>,
    remote: Arc<MemoryRemote>,
    events: Arc<EventFeed<SyncEvent>>,
}

impl World {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            folder_changes: Arc::new(MemoryFolderChanges::new()),
            article_changes: Arc::new(MemoryArticleChanges::new()),
            remote: Arc::new(MemoryRemote::new()),
            events: Arc::new(EventFeed::new()),
        }
    }

    fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            Arc::clone(&self.store) as Arc<dyn FolderStore>,
            Arc::clone(&self.folder_changes) as Arc<dyn FolderChangeStore>,
            Arc::clone(&self.store) as Arc<dyn ArticleStore>,
            Arc::clone(&self.article_changes) as Arc<dyn ArticleChangeStore>,
            Arc::clone(&self.remote) as Arc<dyn FolderClient>,
            Arc::clone(&self.remote) as Arc<dyn BookmarkClient>,
            Arc::clone(&self.events),
            SyncConfig::default(),
        )
    }

    async fn mirror_into(&self, url: &str, selector: FolderSelector, folder: LocalFolderId) -> BookmarkId {
        let remote = self.remote.seed_bookmark(url, selector);
        self.store
            .add_to_folder(Article::from(remote.clone()), folder)
            .await
            .unwrap();
        remote.id
    }
}

#[tokio::test]
async fn fresh_client_converges_onto_service_state() {
    let world = World::new();
    let cooking = world.remote.seed_folder("Cooking");
    world
        .remote
        .seed_bookmark("https://example.com/unread", FolderSelector::Unread);
    world
        .remote
        .seed_bookmark("https://example.com/archived", FolderSelector::Archive);
    let in_folder = world
        .remote
        .seed_bookmark("https://example.com/recipe", FolderSelector::Folder(cooking.id));
    world.remote.mark_liked(in_folder.id);

    world.orchestrator().sync_everything().await.unwrap();

    let local_cooking = world.store.by_remote_id(cooking.id).await.unwrap().unwrap();
    assert_eq!(local_cooking.title, "Cooking");
    assert_eq!(
        world
            .store
            .list_in_folder(LocalFolderId::UNREAD)
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        world
            .store
            .list_in_folder(LocalFolderId::ARCHIVE)
            .await
            .unwrap()
            .len(),
        1
    );
    let recipes = world
        .store
        .list_in_folder(local_cooking.local_id)
        .await
        .unwrap();
    assert_eq!(recipes.len(), 1);
    assert!(recipes[0].liked);
}

#[tokio::test]
async fn pending_changes_drain_to_service() {
    let world = World::new();
    // A folder created offline, with an article moved into it, plus a
    // fresh save and a like.
    let folder = world.store.insert_local_folder("Reading List");
    world.folder_changes.push_add(PendingFolderAdd {
        folder: folder.local_id,
        title: "Reading List".into(),
    });
    let moved = world
        .mirror_into("https://example.com/moved", FolderSelector::Unread, folder.local_id)
        .await;
    world.article_changes.push_move(PendingArticleMove {
        article: moved,
        destination: folder.local_id,
    });
    world.article_changes.push_add(PendingArticleAdd {
        url: "https://example.com/saved-offline".into(),
    });
    let liked = world
        .mirror_into("https://example.com/liked", FolderSelector::Unread, LocalFolderId::UNREAD)
        .await;
    world.store.set_liked(liked, true).await.unwrap();
    world.article_changes.push_like_change(PendingLikeChange {
        article: liked,
        liked: true,
    });

    world.orchestrator().sync_everything().await.unwrap();

    assert!(world.folder_changes.is_drained());
    assert!(world.article_changes.is_drained());

    let pushed = world.remote.folder_by_title("Reading List").unwrap();
    assert_eq!(
        world
            .remote
            .bookmarks_in(FolderSelector::Folder(pushed.id))
            .len(),
        1
    );
    assert_eq!(world.remote.bookmarks_in(FolderSelector::Liked).len(), 1);
    // The offline save landed in unread on both sides.
    assert!(world
        .remote
        .bookmarks_in(FolderSelector::Unread)
        .iter()
        .any(|b| b.url == "https://example.com/saved-offline"));
    assert!(world
        .store
        .list_in_folder(LocalFolderId::UNREAD)
        .await
        .unwrap()
        .iter()
        .any(|a| a.url == "https://example.com/saved-offline"));
}

#[tokio::test]
async fn remote_deletion_ends_in_orphan_collection() {
    let world = World::new();
    let doomed = world
        .mirror_into("https://example.com/doomed", FolderSelector::Unread, LocalFolderId::UNREAD)
        .await;
    let liked = world
        .mirror_into("https://example.com/kept", FolderSelector::Unread, LocalFolderId::UNREAD)
        .await;
    world.store.set_liked(liked, true).await.unwrap();
    world.remote.mark_liked(liked);
    // Both vanish from unread on the service; one of them is liked.
    BookmarkClient::delete(&*world.remote, doomed).await.unwrap();
    BookmarkClient::archive(&*world.remote, liked).await.unwrap();

    world.orchestrator().sync_everything().await.unwrap();

    // The plain article was orphaned by the diff, then collected.
    assert!(world.store.get(doomed).await.unwrap().is_none());
    // The liked one was also pulled from unread but survives cleanup.
    let kept = world.store.get(liked).await.unwrap().unwrap();
    assert!(kept.liked);
}

#[tokio::test]
async fn move_to_unread_after_remote_delete_replaces_row() {
    let world = World::new();
    let article = world
        .mirror_into("https://example.com/revived", FolderSelector::Archive, LocalFolderId::UNREAD)
        .await;
    BookmarkClient::delete(&*world.remote, article).await.unwrap();
    world.article_changes.push_move(PendingArticleMove {
        article,
        destination: LocalFolderId::UNREAD,
    });

    world.orchestrator().sync_everything().await.unwrap();

    let unread = world
        .store
        .list_in_folder(LocalFolderId::UNREAD)
        .await
        .unwrap();
    let matching: Vec<_> = unread
        .iter()
        .filter(|a| a.url == "https://example.com/revived")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_ne!(matching[0].id, article);
    assert!(world.store.get(article).await.unwrap().is_none());
}

#[tokio::test]
async fn offline_sync_fails_and_retries_cleanly() {
    let world = World::new();
    let folder = world.store.insert_local_folder("Recipes");
    world.folder_changes.push_add(PendingFolderAdd {
        folder: folder.local_id,
        title: "Recipes".into(),
    });
    world.remote.set_offline(true);

    assert!(world.orchestrator().sync_everything().await.is_err());
    assert!(!world.folder_changes.is_drained());

    world.remote.set_offline(false);
    world.orchestrator().sync_everything().await.unwrap();
    assert!(world.folder_changes.is_drained());
    assert!(world.remote.folder_by_title("Recipes").is_some());
}

#[tokio::test]
async fn second_full_sync_is_idempotent() {
    let world = World::new();
    let cooking = world.remote.seed_folder("Cooking");
    world
        .remote
        .seed_bookmark("https://example.com/a", FolderSelector::Unread);
    world
        .remote
        .seed_bookmark("https://example.com/b", FolderSelector::Folder(cooking.id));

    world.orchestrator().sync_everything().await.unwrap();
    let after_first = world.store.mutation_count();

    world.orchestrator().sync_everything().await.unwrap();
    assert_eq!(world.store.mutation_count(), after_first);
}

struct WorldFactory {
    world: Arc<World>,
}

struct WorldHandle {
    orchestrator: SyncOrchestrator,
}

#[async_trait]
impl SyncHandle for WorldHandle {
    async fn sync_everything(&mut self) -> SyncResult<()> {
        self.orchestrator.sync_everything().await
    }

    async fn close(self: Box<Self>) {}
}

#[async_trait]
impl SyncHandleFactory for WorldFactory {
    async fn open(&self) -> SyncResult<Box<dyn SyncHandle>> {
        Ok(Box::new(WorldHandle {
            orchestrator: self.world.orchestrator(),
        }))
    }
}

struct FlagDownloader {
    ran: AtomicBool,
}

#[async_trait]
impl ContentDownloader for FlagDownloader {
    async fn download_missing(&self, _cancel: &CancellationToken) -> SyncResult<()> {
        self.ran.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn session_drives_full_sync_and_download() {
    let world = Arc::new(World::new());
    world
        .remote
        .seed_bookmark("https://example.com/a", FolderSelector::Unread);
    let rx = world.events.subscribe();

    let downloader = Arc::new(FlagDownloader {
        ran: AtomicBool::new(false),
    });
    let session = SyncSession::new(
        Arc::new(WorldFactory {
            world: Arc::clone(&world),
        }),
        Arc::clone(&downloader) as Arc<dyn ContentDownloader>,
    );

    session.sync_database_and_articles().await.unwrap();

    assert!(!session.is_syncing());
    assert!(downloader.ran.load(Ordering::SeqCst));
    assert_eq!(
        world
            .store
            .list_in_folder(LocalFolderId::UNREAD)
            .await
            .unwrap()
            .len(),
        1
    );
    let received: Vec<SyncEvent> = rx.try_iter().collect();
    assert_eq!(received.first(), Some(&SyncEvent::SyncStarted));
    assert_eq!(received.last(), Some(&SyncEvent::SyncEnded));
}
