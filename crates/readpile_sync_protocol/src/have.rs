//! Diff-sync fingerprints.

use crate::bookmark::BookmarkId;
use crate::error::ProtocolError;
use std::fmt;

/// A fingerprint of a bookmark's last-known state, sent to the service
/// so it can answer "what changed since I last saw this."
///
/// A fingerprint is immutable once constructed. Its string form is
/// order-sensitive: `id[:hash[:progress:changedUnixSeconds]]`; progress
/// can only be supplied together with a hash.
///
/// # Invariants
///
/// - The bookmark id is never the empty identity.
/// - A supplied hash is never blank.
#[derive(Debug, Clone, PartialEq)]
pub struct HaveStatus {
    id: BookmarkId,
    hash: Option<String>,
    progress: Option<(f64, i64)>,
}

impl HaveStatus {
    /// Creates an id-only fingerprint.
    pub fn new(id: BookmarkId) -> Result<Self, ProtocolError> {
        if id.is_empty() {
            return Err(ProtocolError::EmptyFingerprintId);
        }
        Ok(Self {
            id,
            hash: None,
            progress: None,
        })
    }

    /// Creates a fingerprint carrying the last-known content hash.
    pub fn with_hash(id: BookmarkId, hash: impl Into<String>) -> Result<Self, ProtocolError> {
        let hash = hash.into();
        if hash.trim().is_empty() {
            return Err(ProtocolError::BlankFingerprintHash);
        }
        let mut status = Self::new(id)?;
        status.hash = Some(hash);
        Ok(status)
    }

    /// Creates a fingerprint carrying hash, read progress, and the unix
    /// seconds the progress last changed.
    pub fn with_progress(
        id: BookmarkId,
        hash: impl Into<String>,
        progress: f64,
        changed: i64,
    ) -> Result<Self, ProtocolError> {
        let mut status = Self::with_hash(id, hash)?;
        status.progress = Some((progress, changed));
        Ok(status)
    }

    /// Returns the bookmark id.
    pub fn id(&self) -> BookmarkId {
        self.id
    }

    /// Returns the hash, if one was supplied.
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Returns `(progress, changed unix seconds)`, if supplied.
    pub fn progress(&self) -> Option<(f64, i64)> {
        self.progress
    }
}

impl fmt::Display for HaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(hash) = &self.hash {
            write!(f, ":{hash}")?;
        }
        if let Some((progress, changed)) = self.progress {
            write!(f, ":{progress}:{changed}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_id_rejected() {
        assert_eq!(
            HaveStatus::new(BookmarkId::new(0)),
            Err(ProtocolError::EmptyFingerprintId)
        );
        assert_eq!(
            HaveStatus::with_hash(BookmarkId::new(0), "abc"),
            Err(ProtocolError::EmptyFingerprintId)
        );
    }

    #[test]
    fn blank_hash_rejected() {
        assert_eq!(
            HaveStatus::with_hash(BookmarkId::new(5), ""),
            Err(ProtocolError::BlankFingerprintHash)
        );
        assert_eq!(
            HaveStatus::with_hash(BookmarkId::new(5), "   "),
            Err(ProtocolError::BlankFingerprintHash)
        );
        assert_eq!(
            HaveStatus::with_progress(BookmarkId::new(5), "\t", 0.2, 100),
            Err(ProtocolError::BlankFingerprintHash)
        );
    }

    #[test]
    fn id_only_form() {
        let status = HaveStatus::new(BookmarkId::new(12345)).unwrap();
        assert_eq!(status.to_string(), "12345");
    }

    #[test]
    fn id_and_hash_form() {
        let status = HaveStatus::with_hash(BookmarkId::new(12345), "OjMuzFp6").unwrap();
        assert_eq!(status.to_string(), "12345:OjMuzFp6");
    }

    #[test]
    fn full_form() {
        let status =
            HaveStatus::with_progress(BookmarkId::new(12345), "OjMuzFp6", 0.5, 1288584076)
                .unwrap();
        assert_eq!(status.to_string(), "12345:OjMuzFp6:0.5:1288584076");
    }

    proptest! {
        #[test]
        fn any_nonzero_id_constructs(id in 1u64..) {
            let status = HaveStatus::new(BookmarkId::new(id)).unwrap();
            prop_assert_eq!(status.to_string(), id.to_string());
        }

        #[test]
        fn whitespace_hashes_always_rejected(ws in "[ \t]{0,8}", id in 1u64..) {
            prop_assert_eq!(
                HaveStatus::with_hash(BookmarkId::new(id), ws),
                Err(ProtocolError::BlankFingerprintHash)
            );
        }

        #[test]
        fn full_form_is_order_sensitive(
            id in 1u64..,
            hash in "[A-Za-z0-9+/]{4,12}",
            progress in 0.0f64..=1.0,
            changed in 0i64..=4_000_000_000,
        ) {
            let status =
                HaveStatus::with_progress(BookmarkId::new(id), hash.clone(), progress, changed)
                    .unwrap();
            prop_assert_eq!(
                status.to_string(),
                format!("{id}:{hash}:{progress}:{changed}")
            );
        }
    }
}
