//! Dependency-ordered scheduling and the run driver.

use crate::config::SyncConfig;
use crate::descriptor::{CollectionDescriptor, DescriptorSet};
use crate::engine::{CollectionStats, ExtractionEngine};
use crate::error::{SyncError, SyncResult};
use crate::registry::SyncedIdRegistry;
use crate::store::Store;
use tracing::info;

/// Orders a descriptor set into dependency layers.
///
/// Every descriptor appears exactly once, and a descriptor's dependency is
/// always in an earlier layer. Order among siblings within a layer carries
/// no guarantee.
///
/// This is a layered topological sort with an explicit progress check: a
/// pass over the pending descriptors that yields no newly-ready descriptor
/// means a cycle, a self-reference, or a dependency naming a non-existent
/// collection, and fails with [`SyncError::Scheduling`]. The loop therefore
/// terminates within forest-depth + 1 passes.
pub fn schedule(set: &DescriptorSet) -> SyncResult<Vec<Vec<&CollectionDescriptor>>> {
    set.validate()?;

    let mut done: Vec<&str> = Vec::new();
    let mut pending: Vec<&CollectionDescriptor> = set.iter().collect();
    let mut layers = Vec::new();

    while !pending.is_empty() {
        let (ready, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|d| {
            d.dependency
                .as_deref()
                .map_or(true, |dep| done.contains(&dep))
        });

        if ready.is_empty() {
            return Err(SyncError::Scheduling {
                remaining: rest.iter().map(|d| d.name.clone()).collect(),
            });
        }

        done.extend(ready.iter().map(|d| d.name.as_str()));
        layers.push(ready);
        pending = rest;
    }

    Ok(layers)
}

/// Accumulated statistics for a full run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Per-descriptor extraction stats, in processing order.
    pub collections: Vec<CollectionStats>,
}

impl RunStats {
    /// Total documents inserted across all descriptors.
    #[must_use]
    pub fn total_inserted(&self) -> u64 {
        self.collections.iter().map(|c| c.inserted).sum()
    }

    /// Total documents deleted by the replace policy.
    #[must_use]
    pub fn total_deleted(&self) -> u64 {
        self.collections.iter().map(|c| c.deleted).sum()
    }

    /// Number of descriptors processed.
    #[must_use]
    pub fn descriptors_processed(&self) -> usize {
        self.collections.len()
    }
}

/// Drives a full sync run: schedules the descriptor set, then invokes the
/// extraction engine for each descriptor in dependency order.
///
/// Execution is strictly sequential; the registry and the destination are
/// shared mutable state with no synchronization, so no two extractions
/// overlap, even across independent branches of the dependency forest.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SyncConfig,
}

impl Scheduler {
    /// Creates a scheduler with the given configuration.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Runs the full descriptor set against a source and destination store.
    ///
    /// Any failure aborts the run immediately; documents written for
    /// earlier descriptors are left in place.
    pub fn run<S: Store, D: Store>(
        &self,
        set: &DescriptorSet,
        source: &S,
        dest: &D,
    ) -> SyncResult<RunStats> {
        let layers = schedule(set)?;
        info!(
            descriptors = set.len(),
            layers = layers.len(),
            "schedule computed"
        );

        let engine = ExtractionEngine::new(source, dest, &self.config);
        let mut registry = SyncedIdRegistry::new();
        let mut stats = RunStats::default();

        for layer in layers {
            for descriptor in layer {
                // schedule() guarantees a named dependency resolves.
                let dependency = descriptor
                    .dependency
                    .as_deref()
                    .and_then(|name| set.get(name));
                let collection_stats = engine.extract(descriptor, dependency, &mut registry)?;
                stats.collections.push(collection_stats);
            }
        }

        info!(
            descriptors = stats.descriptors_processed(),
            inserted = stats.total_inserted(),
            "run complete"
        );
        Ok(stats)
    }
}
