//! Run-scoped registry of synced document identifiers.

use crate::document::DocumentId;
use std::collections::BTreeMap;

/// Maps each collection name to the ordered list of destination identifiers
/// inserted for it during the current run.
///
/// The registry is explicit state: it is created at run start, passed by
/// mutable reference through the scheduler and engine, and discarded when
/// the run ends. Only the extraction engine appends to it; descriptors that
/// name a collection as their dependency read it.
#[derive(Debug, Clone, Default)]
pub struct SyncedIdRegistry {
    ids: BTreeMap<String, Vec<DocumentId>>,
}

impl SyncedIdRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an identifier to a collection's list.
    pub fn record(&mut self, collection: &str, id: DocumentId) {
        self.ids.entry(collection.to_string()).or_default().push(id);
    }

    /// Returns the identifiers recorded for a collection, in insertion
    /// order. Empty if nothing was recorded.
    #[must_use]
    pub fn ids_for(&self, collection: &str) -> &[DocumentId] {
        self.ids.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of identifiers recorded for a collection.
    #[must_use]
    pub fn count_for(&self, collection: &str) -> usize {
        self.ids_for(collection).len()
    }

    /// Returns the collection names with at least one recorded identifier.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
