//! Error types for the sync engine.

use readpile_sync_protocol::{ProtocolError, RemoteError};
use thiserror::Error;

use crate::store::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can abort a sync pass.
///
/// Recoverable remote conditions (not-found, duplicate title) are
/// absorbed inside the coordinators and never surface here; a
/// `Remote` variant always means the phase could not classify the
/// failure and left its remaining pending rows for the next pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed in a way the coordinators do not recover.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// A local store call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A fingerprint could not be built from stored article state.
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] ProtocolError),

    /// Local and remote state disagree in a way the protocol does not
    /// allow.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The sync was cancelled through its cancellation handle.
    #[error("sync cancelled")]
    Cancelled,

    /// The background sync task died before producing a result.
    #[error("background sync task failed: {0}")]
    Background(String),
}

impl SyncError {
    /// Returns true if this error reports a cooperative cancellation
    /// rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}
