//! Extraction engine: pulls matching documents from the source store and
//! writes them to the destination, one descriptor at a time.

use crate::config::{ExistingDataPolicy, SyncConfig};
use crate::descriptor::{CollectionDescriptor, JoinMode};
use crate::document::{DocumentId, ID_FIELD};
use crate::error::{SyncError, SyncResult};
use crate::filter::{normalize, Criteria, Predicate};
use crate::registry::SyncedIdRegistry;
use crate::store::{CollectionHandle, Store};
use serde_json::Value;
use tracing::{debug, info};

/// Counters for one descriptor's extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    /// The collection the descriptor named.
    pub collection: String,
    /// Documents inserted into the destination.
    pub inserted: u64,
    /// Documents deleted from the destination by the replace policy.
    pub deleted: u64,
    /// Join batches executed (zero for unjoined extraction).
    pub batches: u64,
}

impl CollectionStats {
    fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            inserted: 0,
            deleted: 0,
            batches: 0,
        }
    }
}

/// Copies one descriptor's documents from source to destination.
///
/// The engine selects one of three mutually exclusive extraction modes from
/// the descriptor's shape:
///
/// - **unjoined**: the descriptor's filters alone select documents
/// - **forward join**: the descriptor's `foreign_key` field is matched
///   against the identifiers the dependency contributed to the registry
/// - **reverse join**: the dependency's already-written destination
///   documents are asked for the distinct values of `reference_key`, and
///   those values select this collection's documents by identifier
///
/// Join identifier lists are partitioned into contiguous, non-overlapping,
/// exhaustive batches of `SyncConfig::batch_size`, so the union of
/// per-batch results equals one unbounded query over the full list.
pub struct ExtractionEngine<'a, S: Store, D: Store> {
    source: &'a S,
    dest: &'a D,
    config: &'a SyncConfig,
}

impl<'a, S: Store, D: Store> ExtractionEngine<'a, S, D> {
    /// Creates an engine over a source and destination store.
    pub fn new(source: &'a S, dest: &'a D, config: &'a SyncConfig) -> Self {
        Self {
            source,
            dest,
            config,
        }
    }

    /// Extracts one descriptor's documents, appending every inserted
    /// identifier to `registry[descriptor.name]`.
    ///
    /// A join descriptor whose dependency contributed no identifiers
    /// completes as a no-op success.
    pub fn extract(
        &self,
        descriptor: &CollectionDescriptor,
        dependency: Option<&CollectionDescriptor>,
        registry: &mut SyncedIdRegistry,
    ) -> SyncResult<CollectionStats> {
        let mode = descriptor.join_mode()?;
        let base = normalize(&descriptor.filters)?;
        let mut stats = CollectionStats::new(&descriptor.name);
        stats.deleted = self.apply_existing_policy(descriptor, &base)?;

        match mode {
            JoinMode::Unjoined => {
                info!(collection = %descriptor.name, "extracting");
                stats.inserted = self.copy_matching(descriptor, &base, registry)?;
            }
            JoinMode::Forward(join_key) => {
                let dep = resolve_dependency(descriptor, dependency)?;
                let parent_ids: Vec<DocumentId> = registry.ids_for(&dep.name).to_vec();
                if parent_ids.is_empty() {
                    debug!(
                        collection = %descriptor.name,
                        dependency = %dep.name,
                        "dependency contributed no identifiers, nothing to join"
                    );
                    return Ok(stats);
                }
                info!(
                    collection = %descriptor.name,
                    dependency = %dep.name,
                    join_key,
                    parents = parent_ids.len(),
                    "extracting with forward join"
                );
                for batch in parent_ids.chunks(self.config.batch_size) {
                    let members: Vec<Value> = batch.iter().map(DocumentId::to_value).collect();
                    let criteria = base.clone().with(join_key, Predicate::In(members));
                    stats.inserted += self.copy_matching(descriptor, &criteria, registry)?;
                    stats.batches += 1;
                }
            }
            JoinMode::Reverse(reference_field) => {
                let dep = resolve_dependency(descriptor, dependency)?;
                let parent_ids: Vec<DocumentId> = registry.ids_for(&dep.name).to_vec();
                if parent_ids.is_empty() {
                    debug!(
                        collection = %descriptor.name,
                        dependency = %dep.name,
                        "dependency contributed no identifiers, nothing to join"
                    );
                    return Ok(stats);
                }
                info!(
                    collection = %descriptor.name,
                    dependency = %dep.name,
                    reference_field,
                    parents = parent_ids.len(),
                    "extracting with reverse join"
                );
                let dep_dest = self.dest.collection(&dep.name);
                for batch in parent_ids.chunks(self.config.batch_size) {
                    let members: Vec<Value> = batch.iter().map(DocumentId::to_value).collect();
                    let parent_criteria =
                        Criteria::empty().with(ID_FIELD, Predicate::In(members));
                    let referenced = dep_dest
                        .distinct_values(&parent_criteria, reference_field)
                        .map_err(|e| SyncError::store(&dep.name, "distinct_values", e))?;
                    stats.batches += 1;
                    if referenced.is_empty() {
                        continue;
                    }
                    let criteria = base.clone().with(ID_FIELD, Predicate::In(referenced));
                    stats.inserted += self.copy_matching(descriptor, &criteria, registry)?;
                }
            }
        }

        info!(
            collection = %descriptor.name,
            inserted = stats.inserted,
            deleted = stats.deleted,
            batches = stats.batches,
            "extraction complete"
        );
        Ok(stats)
    }

    /// Streams source documents matching the criteria into the
    /// destination, recording each inserted identifier.
    fn copy_matching(
        &self,
        descriptor: &CollectionDescriptor,
        criteria: &Criteria,
        registry: &mut SyncedIdRegistry,
    ) -> SyncResult<u64> {
        let source = self.source.collection(&descriptor.name);
        let dest = self.dest.collection(&descriptor.name);
        let cursor = source
            .find(criteria)
            .map_err(|e| SyncError::store(&descriptor.name, "find", e))?;

        let mut inserted = 0;
        for result in cursor {
            let document = result.map_err(|e| SyncError::store(&descriptor.name, "find", e))?;
            let id = dest
                .insert_one(document)
                .map_err(|e| SyncError::store(&descriptor.name, "insert_one", e))?;
            registry.record(&descriptor.name, id);
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Enforces the configured policy for pre-existing destination data,
    /// returning how many documents the replace policy deleted.
    fn apply_existing_policy(
        &self,
        descriptor: &CollectionDescriptor,
        base: &Criteria,
    ) -> SyncResult<u64> {
        let dest = self.dest.collection(&descriptor.name);
        match self.config.existing_data {
            ExistingDataPolicy::Fail => {
                let count = dest
                    .count(&Criteria::empty())
                    .map_err(|e| SyncError::store(&descriptor.name, "count", e))?;
                if count > 0 {
                    return Err(SyncError::DestinationNotEmpty {
                        collection: descriptor.name.clone(),
                        count,
                    });
                }
                Ok(0)
            }
            ExistingDataPolicy::Replace => dest
                .delete_many(base)
                .map_err(|e| SyncError::store(&descriptor.name, "delete_many", e)),
            ExistingDataPolicy::Append => Ok(0),
        }
    }
}

fn resolve_dependency<'d>(
    descriptor: &CollectionDescriptor,
    dependency: Option<&'d CollectionDescriptor>,
) -> SyncResult<&'d CollectionDescriptor> {
    dependency.ok_or_else(|| {
        SyncError::invalid_descriptor(
            &descriptor.name,
            "join descriptor invoked without its dependency descriptor",
        )
    })
}
