//! Configuration for the sync engine.

/// Default cap on articles listed per folder during diff-sync.
pub const DEFAULT_PER_FOLDER_LIMIT: u32 = 25;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Cap on articles listed per folder (and for the liked collection)
    /// during diff-sync.
    pub per_folder_limit: u32,
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            per_folder_limit: DEFAULT_PER_FOLDER_LIMIT,
        }
    }

    /// Sets the per-folder article limit.
    pub fn with_per_folder_limit(mut self, limit: u32) -> Self {
        self.per_folder_limit = limit;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
