//! Remote folder shapes and folder addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a folder on the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RemoteFolderId(u64);

impl RemoteFolderId {
    /// Creates a remote folder id from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RemoteFolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user folder as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    /// Folder identity.
    pub id: RemoteFolderId,
    /// Title, unique per account.
    pub title: String,
    /// Service-assigned ordering key.
    pub position: i64,
    /// Whether the service wants clients to sync this folder.
    pub should_sync: bool,
}

/// Addresses a folder in listing calls: either one of the well-known
/// virtual folders or a user folder by remote id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderSelector {
    /// The unread folder.
    Unread,
    /// The archive folder.
    Archive,
    /// The liked virtual collection.
    Liked,
    /// A user folder.
    Folder(RemoteFolderId),
}

impl fmt::Display for FolderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderSelector::Unread => write!(f, "unread"),
            FolderSelector::Archive => write!(f, "archive"),
            FolderSelector::Liked => write!(f, "liked"),
            FolderSelector::Folder(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_display() {
        assert_eq!(FolderSelector::Unread.to_string(), "unread");
        assert_eq!(FolderSelector::Archive.to_string(), "archive");
        assert_eq!(FolderSelector::Liked.to_string(), "liked");
        assert_eq!(
            FolderSelector::Folder(RemoteFolderId::new(812)).to_string(),
            "812"
        );
    }
}
