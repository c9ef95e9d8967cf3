//! # Readpile Sync Engine
//!
//! Client-side synchronization core for Readpile.
//!
//! This crate provides:
//! - Folder reconciliation against the remote service
//! - Bookmark reconciliation with move/like semantics and fingerprint
//!   diff-sync
//! - Pending-change drain (uploads of offline edits)
//! - Orphan cleanup
//! - A single-flight, cancellable session wrapper that sequences a full
//!   sync and the downstream content download
//!
//! ## Architecture
//!
//! The engine never talks to a database or the network directly. Local
//! state is reached through the store traits ([`FolderStore`],
//! [`ArticleStore`] and the pending-change stores), the service through
//! the client traits ([`FolderClient`], [`BookmarkClient`]); both come
//! with in-memory implementations for tests and scaffolding.
//! Coordinators are peers owned by the [`SyncOrchestrator`], which runs
//! them strictly in order: folders, then bookmarks, then orphan
//! cleanup.
//!
//! ## Key Invariants
//!
//! - The service is authoritative; local state converges toward it
//! - Pending-change drains always precede diff-sync
//! - A remote not-found is recoverable everywhere it can occur
//! - A failed remote call never leaves local state half-mutated
//! - At most one sync runs per [`SyncSession`] at a time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bookmarks;
mod cleanup;
mod config;
mod downloader;
mod error;
mod events;
mod folders;
mod memory;
mod model;
mod orchestrator;
mod remote;
mod session;
mod store;

pub use bookmarks::BookmarkCoordinator;
pub use cleanup::OrphanCollector;
pub use config::SyncConfig;
pub use downloader::{ContentDownloader, NullDownloader};
pub use error::{SyncError, SyncResult};
pub use events::{DownloadEvent, EventFeed, SyncEvent};
pub use folders::FolderCoordinator;
pub use memory::{MemoryArticleChanges, MemoryFolderChanges, MemoryStore};
pub use model::{
    Article, Folder, LocalFolderId, PendingArticleAdd, PendingArticleDelete, PendingArticleMove,
    PendingFolderAdd, PendingFolderDelete, PendingLikeChange,
};
pub use orchestrator::SyncOrchestrator;
pub use remote::{BookmarkClient, FolderClient, MemoryRemote};
pub use session::{SyncHandle, SyncHandleFactory, SyncSession};
pub use store::{
    ArticleChangeStore, ArticleStore, FolderChangeStore, FolderStore, StoreError, StoreResult,
};
