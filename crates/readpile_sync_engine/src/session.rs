//! Single-flight sync sessions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::downloader::ContentDownloader;
use crate::error::{SyncError, SyncResult};
use crate::events::EventFeed;

/// A sync engine bound to an isolated store connection, valid for one
/// run.
///
/// The session obtains one of these per invocation so every sync runs
/// against its own connection, distinct from whatever the UI holds
/// open.
#[async_trait]
pub trait SyncHandle: Send {
    /// Runs the full database sync.
    async fn sync_everything(&mut self) -> SyncResult<()>;

    /// Closes the underlying store connection.
    async fn close(self: Box<Self>);
}

/// Opens fresh [`SyncHandle`]s, one per sync run.
#[async_trait]
pub trait SyncHandleFactory: Send + Sync {
    /// Opens an isolated store connection and builds a sync engine on
    /// it.
    async fn open(&self) -> SyncResult<Box<dyn SyncHandle>>;
}

/// Runs syncs one at a time on a background task.
///
/// # State machine
///
/// Idle → Syncing → Idle. The session is syncing exactly while it holds
/// a cancellation handle; [`SyncSession::is_syncing`] is derived from
/// that handle's presence and flips synchronously before the first
/// suspension point of a call. Every completion path (success,
/// failure, or cancellation) clears the handle, and both flips emit a
/// change notification.
///
/// Cancellation is cooperative: it is observed at the top of the
/// background task and between the database sync and the download pass,
/// never mid-call.
pub struct SyncSession {
    factory: Arc<dyn SyncHandleFactory>,
    downloader: Arc<dyn ContentDownloader>,
    active: Mutex<Option<CancellationToken>>,
    changed: EventFeed<bool>,
}

impl SyncSession {
    /// Creates an idle session.
    pub fn new(factory: Arc<dyn SyncHandleFactory>, downloader: Arc<dyn ContentDownloader>) -> Self {
        Self {
            factory,
            downloader,
            active: Mutex::new(None),
            changed: EventFeed::new(),
        }
    }

    /// Returns true while a sync run is in flight.
    pub fn is_syncing(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Subscribes to is-syncing change notifications.
    ///
    /// Notifications may be delivered on any thread; subscribers
    /// redispatch as needed.
    pub fn subscribe(&self) -> Receiver<bool> {
        self.changed.subscribe()
    }

    /// Signals the current run's cancellation handle. No-op while idle.
    pub fn cancel(&self) {
        if let Some(token) = self.active.lock().as_ref() {
            debug!("cancelling in-flight sync");
            token.cancel();
        }
    }

    /// Runs the full database sync and, if it succeeds, the content
    /// download pass.
    ///
    /// Calling this while a run is already in flight performs nothing
    /// and returns immediately.
    pub async fn sync_database_and_articles(&self) -> SyncResult<()> {
        let cancel = {
            let mut active = self.active.lock();
            if active.is_some() {
                debug!("sync already in flight, ignoring re-entry");
                return Ok(());
            }
            let token = CancellationToken::new();
            *active = Some(token.clone());
            token
        };
        self.changed.emit(true);

        let factory = Arc::clone(&self.factory);
        let downloader = Arc::clone(&self.downloader);
        let joined = tokio::spawn(Self::run(factory, downloader, cancel)).await;

        *self.active.lock() = None;
        self.changed.emit(false);

        match joined {
            Ok(result) => result,
            Err(err) => Err(SyncError::Background(err.to_string())),
        }
    }

    async fn run(
        factory: Arc<dyn SyncHandleFactory>,
        downloader: Arc<dyn ContentDownloader>,
        cancel: CancellationToken,
    ) -> SyncResult<()> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let mut handle = factory.open().await?;
        let synced = handle.sync_everything().await;
        // The run's connection is closed before any download attempt,
        // whatever the sync outcome was.
        handle.close().await;
        synced?;

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        info!("database sync complete, downloading missing content");
        downloader.download_missing(&cancel).await
    }
}
