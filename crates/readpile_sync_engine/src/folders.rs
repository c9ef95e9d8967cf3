//! Folder reconciliation.

use readpile_sync_protocol::{RemoteError, RemoteFolder, RemoteFolderId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::model::{Folder, LocalFolderId, PendingFolderAdd};
use crate::remote::FolderClient;
use crate::store::{FolderChangeStore, FolderStore};

/// Reconciles local folders with the service.
///
/// A sync pass first uploads pending local mutations, then pulls the
/// remote folder list and converges local state onto it. The service is
/// authoritative: folders it no longer has are deleted locally, folders
/// it has and the store does not are created.
pub struct FolderCoordinator {
    folders: Arc<dyn FolderStore>,
    changes: Arc<dyn FolderChangeStore>,
    client: Arc<dyn FolderClient>,
}

impl FolderCoordinator {
    /// Creates a coordinator over the given collaborators.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        changes: Arc<dyn FolderChangeStore>,
        client: Arc<dyn FolderClient>,
    ) -> Self {
        Self {
            folders,
            changes,
            client,
        }
    }

    /// Runs a full folder reconciliation.
    ///
    /// Order matters: pending adds are uploaded first so every local
    /// folder has a remote id by the time the remote listing is diffed
    /// against local state.
    pub async fn sync_folders(&self) -> SyncResult<()> {
        self.drain_pending_adds().await?;
        self.drain_pending_deletes().await?;
        self.reconcile().await
    }

    /// Uploads the single pending add for `folder`, returning the
    /// now-synced folder.
    ///
    /// This is the narrow operation the article coordinator needs when
    /// a pending move targets a folder the service has never seen.
    pub async fn push_local_folder(&self, folder: LocalFolderId) -> SyncResult<Folder> {
        let pending = self
            .changes
            .pending_adds()
            .await?
            .into_iter()
            .find(|p| p.folder == folder)
            .ok_or_else(|| {
                SyncError::Protocol(format!("folder {folder} has no remote id and no pending add"))
            })?;
        let local = self.folders.by_local_id(folder).await?.ok_or_else(|| {
            SyncError::Protocol(format!("pending add references missing folder {folder}"))
        })?;
        self.apply_pending_add(&pending, &local).await
    }

    async fn drain_pending_adds(&self) -> SyncResult<()> {
        for pending in self.changes.pending_adds().await? {
            match self.folders.by_local_id(pending.folder).await? {
                Some(local) => {
                    self.apply_pending_add(&pending, &local).await?;
                }
                None => {
                    warn!(folder = %pending.folder, "pending add references a missing folder, dropping");
                    self.changes.remove_add(pending.folder).await?;
                }
            }
        }
        Ok(())
    }

    /// Creates the folder on the service and applies the service's view
    /// of it onto the local row, consuming the pending add.
    ///
    /// A duplicate-title rejection is the service saying "already
    /// exists, here it is": the remote listing is searched for the
    /// matching title and that folder adopted as the result.
    async fn apply_pending_add(
        &self,
        pending: &PendingFolderAdd,
        local: &Folder,
    ) -> SyncResult<Folder> {
        let remote = match self.client.add(&pending.title).await {
            Ok(folder) => folder,
            Err(RemoteError::DuplicateTitle) => self
                .client
                .list()
                .await
                .map_err(SyncError::from)?
                .into_iter()
                .find(|f| f.title == pending.title)
                .ok_or_else(|| {
                    SyncError::Protocol(format!(
                        "service reported folder '{}' as duplicate but does not list it",
                        pending.title
                    ))
                })?,
            Err(err) => return Err(err.into()),
        };

        let folder = Folder {
            local_id: local.local_id,
            remote_id: Some(remote.id),
            title: remote.title,
            position: remote.position,
            should_sync: remote.should_sync,
        };
        self.folders.update(&folder).await?;
        self.changes.remove_add(pending.folder).await?;
        debug!(folder = %folder.local_id, remote = %remote.id, "uploaded pending folder add");
        Ok(folder)
    }

    async fn drain_pending_deletes(&self) -> SyncResult<()> {
        for pending in self.changes.pending_deletes().await? {
            match self.client.delete(pending.remote_id).await {
                Ok(()) => {}
                // Already gone remotely; the delete is satisfied.
                Err(RemoteError::NotFound) => {
                    debug!(remote = %pending.remote_id, "folder already deleted on the service");
                }
                Err(err) => return Err(err.into()),
            }
            self.changes.remove_delete(pending.remote_id).await?;
        }
        Ok(())
    }

    async fn reconcile(&self) -> SyncResult<()> {
        let remote: Vec<RemoteFolder> = self
            .client
            .list()
            .await
            .map_err(SyncError::from)?
            .into_iter()
            .filter(|f| f.should_sync)
            .collect();
        // Well-known folders are permanent and never part of this diff.
        let local: Vec<Folder> = self
            .folders
            .list()
            .await?
            .into_iter()
            .filter(|f| !f.is_well_known())
            .collect();

        for folder in &remote {
            match self.folders.by_remote_id(folder.id).await? {
                None => {
                    self.folders
                        .add_known(&folder.title, folder.id, folder.position, folder.should_sync)
                        .await?;
                    debug!(remote = %folder.id, title = %folder.title, "created folder from service");
                }
                Some(existing) => {
                    if existing.title != folder.title
                        || existing.position != folder.position
                        || existing.should_sync != folder.should_sync
                    {
                        self.folders
                            .update(&Folder {
                                local_id: existing.local_id,
                                remote_id: Some(folder.id),
                                title: folder.title.clone(),
                                position: folder.position,
                                should_sync: folder.should_sync,
                            })
                            .await?;
                    }
                }
            }
        }

        let remote_ids: HashSet<RemoteFolderId> = remote.iter().map(|f| f.id).collect();
        for folder in local {
            // Every surviving user folder was uploaded by the add drain.
            debug_assert!(
                folder.remote_id.is_some(),
                "user folder without remote id survived the add drain"
            );
            let Some(remote_id) = folder.remote_id else {
                warn!(folder = %folder.local_id, "user folder has no remote id, skipping deletion check");
                continue;
            };
            if !remote_ids.contains(&remote_id) {
                self.folders.delete(folder.local_id).await?;
                debug!(folder = %folder.local_id, "deleted folder removed on the service");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryFolderChanges, MemoryStore};
    use crate::remote::MemoryRemote;

    struct Fixture {
        store: Arc<MemoryStore>,
        changes: Arc<MemoryFolderChanges>,
        remote: Arc<MemoryRemote>,
        coordinator: FolderCoordinator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let changes = Arc::new(MemoryFolderChanges::new());
        let remote = Arc::new(MemoryRemote::new());
        let coordinator = FolderCoordinator::new(
            Arc::clone(&store) as Arc<dyn FolderStore>,
            Arc::clone(&changes) as Arc<dyn FolderChangeStore>,
            Arc::clone(&remote) as Arc<dyn FolderClient>,
        );
        Fixture {
            store,
            changes,
            remote,
            coordinator,
        }
    }

    #[tokio::test]
    async fn pending_add_converges_local_folder() {
        let fx = fixture();
        let local = fx.store.insert_local_folder("Recipes");
        fx.changes.push_add(PendingFolderAdd {
            folder: local.local_id,
            title: "Recipes".into(),
        });

        fx.coordinator.sync_folders().await.unwrap();

        let remote = fx.remote.folder_by_title("Recipes").expect("created remotely");
        let synced = fx
            .store
            .by_local_id(local.local_id)
            .await
            .unwrap()
            .expect("still present");
        assert_eq!(synced.remote_id, Some(remote.id));
        assert!(fx.changes.is_drained());
    }

    #[tokio::test]
    async fn duplicate_title_adopts_existing_remote_folder() {
        let fx = fixture();
        let existing = fx.remote.seed_folder("Recipes");
        let local = fx.store.insert_local_folder("Recipes");
        fx.changes.push_add(PendingFolderAdd {
            folder: local.local_id,
            title: "Recipes".into(),
        });

        fx.coordinator.sync_folders().await.unwrap();

        let synced = fx
            .store
            .by_local_id(local.local_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(synced.remote_id, Some(existing.id));
        assert_eq!(synced.position, existing.position);
        assert!(fx.changes.is_drained());
        // Exactly one "Recipes" locally.
        let count = FolderStore::list(&*fx.store)
            .await
            .unwrap()
            .iter()
            .filter(|f| f.title == "Recipes")
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn pending_delete_tolerates_missing_remote_folder() {
        let fx = fixture();
        fx.changes.push_delete(crate::model::PendingFolderDelete {
            remote_id: RemoteFolderId::new(777),
        });

        fx.coordinator.sync_folders().await.unwrap();
        assert!(fx.changes.is_drained());
    }

    #[tokio::test]
    async fn remote_folders_are_mirrored_locally() {
        let fx = fixture();
        let cooking = fx.remote.seed_folder("Cooking");
        fx.remote.seed_folder("Travel");

        fx.coordinator.sync_folders().await.unwrap();

        let folders = FolderStore::list(&*fx.store).await.unwrap();
        assert_eq!(folders.len(), 4); // two well-known + two mirrored
        let mirrored = fx.store.by_remote_id(cooking.id).await.unwrap().unwrap();
        assert_eq!(mirrored.title, "Cooking");
    }

    #[tokio::test]
    async fn remote_deletion_removes_local_folder() {
        let fx = fixture();
        let remote = fx.remote.seed_folder("Ephemeral");
        fx.coordinator.sync_folders().await.unwrap();
        assert!(fx.store.by_remote_id(remote.id).await.unwrap().is_some());

        FolderClient::delete(&*fx.remote, remote.id).await.unwrap();
        fx.coordinator.sync_folders().await.unwrap();
        assert!(fx.store.by_remote_id(remote.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_pass_is_idempotent() {
        let fx = fixture();
        let local = fx.store.insert_local_folder("Recipes");
        fx.changes.push_add(PendingFolderAdd {
            folder: local.local_id,
            title: "Recipes".into(),
        });
        fx.remote.seed_folder("Travel");

        fx.coordinator.sync_folders().await.unwrap();
        let after_first = fx.store.mutation_count();

        fx.coordinator.sync_folders().await.unwrap();
        assert_eq!(fx.store.mutation_count(), after_first);
    }

    #[tokio::test]
    async fn unclassified_failure_keeps_pending_rows() {
        let fx = fixture();
        let local = fx.store.insert_local_folder("Recipes");
        fx.changes.push_add(PendingFolderAdd {
            folder: local.local_id,
            title: "Recipes".into(),
        });
        fx.remote.set_offline(true);

        assert!(fx.coordinator.sync_folders().await.is_err());
        assert!(!fx.changes.is_drained());

        fx.remote.set_offline(false);
        fx.coordinator.sync_folders().await.unwrap();
        assert!(fx.changes.is_drained());
    }
}
