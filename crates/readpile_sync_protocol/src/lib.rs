//! # Readpile Sync Protocol
//!
//! Protocol types for talking to the Readpile bookmarking service.
//!
//! This crate provides:
//! - `HaveStatus` fingerprints for diff-sync
//! - Remote folder and bookmark shapes
//! - `FolderSelector` for addressing well-known and user folders
//! - The tagged `RemoteError` taxonomy every service call reports through
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bookmark;
mod error;
mod folder;
mod have;

pub use bookmark::{BookmarkDiff, BookmarkId, RemoteBookmark};
pub use error::{ProtocolError, RemoteError, RemoteResult};
pub use folder::{FolderSelector, RemoteFolder, RemoteFolderId};
pub use have::HaveStatus;
