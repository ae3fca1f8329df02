//! Configuration for sync runs.

/// Default number of parent identifiers per join batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// What to do when a destination collection already holds documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingDataPolicy {
    /// Refuse to run: fail if the destination collection is non-empty.
    /// Guards against silent data duplication on re-runs.
    #[default]
    Fail,
    /// Delete destination documents matching the descriptor's filter
    /// criteria before extracting, so re-runs replace rather than
    /// accumulate.
    Replace,
    /// Insert without checking or deleting anything.
    Append,
}

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of parent identifiers per join batch. Tunable for query-size
    /// limits; correctness does not depend on it.
    pub batch_size: usize,
    /// Policy for pre-existing destination data.
    pub existing_data: ExistingDataPolicy,
}

impl SyncConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            existing_data: ExistingDataPolicy::default(),
        }
    }

    /// Sets the join batch size. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the existing-data policy.
    #[must_use]
    pub fn with_existing_data(mut self, policy: ExistingDataPolicy) -> Self {
        self.existing_data = policy;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
