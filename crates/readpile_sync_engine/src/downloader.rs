//! Content download seam.
//!
//! The downloader fetches article bodies and images for everything
//! lacking local content. Its HTML handling lives outside this crate;
//! the session manager only triggers it after a successful database
//! sync and hands it the run's cancellation handle. Downloaders raise
//! [`crate::DownloadEvent`]s through their own feed; this crate
//! consumes those purely as notifications.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SyncResult;

/// Downloads locally-missing article content.
#[async_trait]
pub trait ContentDownloader: Send + Sync {
    /// Downloads content for every article lacking it, observing
    /// `cancel` cooperatively at phase boundaries.
    async fn download_missing(&self, cancel: &CancellationToken) -> SyncResult<()>;
}

/// A downloader that downloads nothing.
#[derive(Debug, Default)]
pub struct NullDownloader;

#[async_trait]
impl ContentDownloader for NullDownloader {
    async fn download_missing(&self, _cancel: &CancellationToken) -> SyncResult<()> {
        Ok(())
    }
}
