//! In-memory document store for tests and ephemeral runs.

use crate::document::{Document, DocumentId};
use crate::filter::Criteria;
use crate::store::{
    distinct_from_documents, prepare_insert, CollectionHandle, Cursor, Store, StoreResult,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
    find_calls: RwLock<BTreeMap<String, u64>>,
}

/// An in-memory document store.
///
/// Cloning is cheap and clones share the same data, so a test can keep a
/// handle to inspect a store it passed into a run. The store also counts
/// `find` calls per collection, which tests use to assert batching
/// behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection with documents, assigning identifiers to any
    /// document that lacks one. Returns the identifiers in order.
    pub fn seed(&self, collection: &str, documents: Vec<Document>) -> StoreResult<Vec<DocumentId>> {
        let handle = self.collection(collection);
        documents
            .into_iter()
            .map(|doc| handle.insert_one(doc))
            .collect()
    }

    /// Returns a snapshot of a collection's documents.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.shared
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns how many times `find` was called on a collection.
    #[must_use]
    pub fn find_calls(&self, collection: &str) -> u64 {
        self.shared
            .find_calls
            .read()
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the names of non-empty collections.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        self.shared.collections.read().keys().cloned().collect()
    }
}

impl Store for MemoryStore {
    type Collection = MemoryCollection;

    fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            store: self.clone(),
            name: name.to_string(),
        }
    }
}

/// A handle into one collection of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    store: MemoryStore,
    name: String,
}

impl CollectionHandle for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, criteria: &Criteria) -> StoreResult<Cursor> {
        *self
            .store
            .shared
            .find_calls
            .write()
            .entry(self.name.clone())
            .or_insert(0) += 1;

        let collections = self.store.shared.collections.read();
        let matching: Vec<Document> = collections
            .get(&self.name)
            .map(|docs| docs.iter().filter(|d| criteria.matches(d)).cloned().collect())
            .unwrap_or_default();
        Ok(Cursor::from_documents(matching))
    }

    fn count(&self, criteria: &Criteria) -> StoreResult<u64> {
        let collections = self.store.shared.collections.read();
        Ok(collections
            .get(&self.name)
            .map(|docs| docs.iter().filter(|d| criteria.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    fn insert_one(&self, mut document: Document) -> StoreResult<DocumentId> {
        let id = prepare_insert(&self.name, &mut document)?;
        self.store
            .shared
            .collections
            .write()
            .entry(self.name.clone())
            .or_default()
            .push(document);
        Ok(id)
    }

    fn delete_many(&self, criteria: &Criteria) -> StoreResult<u64> {
        let mut collections = self.store.shared.collections.write();
        let Some(docs) = collections.get_mut(&self.name) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !criteria.matches(d));
        Ok((before - docs.len()) as u64)
    }

    fn distinct_values(&self, criteria: &Criteria, field: &str) -> StoreResult<Vec<Value>> {
        let collections = self.store.shared.collections.read();
        let empty = Vec::new();
        let docs = collections.get(&self.name).unwrap_or(&empty);
        Ok(distinct_from_documents(docs.iter(), criteria, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Predicate;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_json(value).unwrap()
    }

    #[test]
    fn insert_assigns_id_when_missing() {
        let store = MemoryStore::new();
        let handle = store.collection("orders");
        let id = handle.insert_one(doc(json!({"status": "open"}))).unwrap();

        let docs = store.documents("orders");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), Some(id));
    }

    #[test]
    fn insert_keeps_existing_id() {
        let store = MemoryStore::new();
        let handle = store.collection("orders");
        let id = DocumentId::new();
        let mut document = doc(json!({"status": "open"}));
        document.set_id(id);

        assert_eq!(handle.insert_one(document).unwrap(), id);
    }

    #[test]
    fn insert_rejects_malformed_id() {
        let store = MemoryStore::new();
        let handle = store.collection("orders");
        let result = handle.insert_one(doc(json!({"_id": "bogus"})));
        assert!(result.is_err());
    }

    #[test]
    fn find_filters_and_counts_calls() {
        let store = MemoryStore::new();
        store
            .seed(
                "orders",
                vec![
                    doc(json!({"status": "open"})),
                    doc(json!({"status": "closed"})),
                    doc(json!({"status": "open"})),
                ],
            )
            .unwrap();

        let criteria = Criteria::empty().with("status", Predicate::Eq(json!("open")));
        let handle = store.collection("orders");
        let found: Vec<_> = handle.find(&criteria).unwrap().collect();
        assert_eq!(found.len(), 2);
        assert_eq!(store.find_calls("orders"), 1);
        assert_eq!(handle.count(&criteria).unwrap(), 2);
    }

    #[test]
    fn missing_collection_reads_as_empty() {
        let store = MemoryStore::new();
        let handle = store.collection("nothing");
        assert_eq!(handle.count(&Criteria::empty()).unwrap(), 0);
        assert_eq!(handle.find(&Criteria::empty()).unwrap().count(), 0);
        assert_eq!(handle.delete_many(&Criteria::empty()).unwrap(), 0);
    }

    #[test]
    fn delete_many_removes_matching() {
        let store = MemoryStore::new();
        store
            .seed(
                "orders",
                vec![doc(json!({"status": "open"})), doc(json!({"status": "closed"}))],
            )
            .unwrap();

        let criteria = Criteria::empty().with("status", Predicate::Eq(json!("open")));
        let deleted = store.collection("orders").delete_many(&criteria).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.documents("orders").len(), 1);
    }

    #[test]
    fn distinct_values_deduplicates() {
        let store = MemoryStore::new();
        store
            .seed(
                "orders",
                vec![
                    doc(json!({"region": "north"})),
                    doc(json!({"region": "north"})),
                    doc(json!({"region": "south"})),
                    doc(json!({"other": 1})),
                ],
            )
            .unwrap();

        let values = store
            .collection("orders")
            .distinct_values(&Criteria::empty(), "region")
            .unwrap();
        assert_eq!(values, vec![json!("north"), json!("south")]);
    }

    #[test]
    fn distinct_values_flattens_arrays() {
        let store = MemoryStore::new();
        store
            .seed(
                "orders",
                vec![
                    doc(json!({"tags": ["a", "b"]})),
                    doc(json!({"tags": ["b", "c"]})),
                ],
            )
            .unwrap();

        let values = store
            .collection("orders")
            .distinct_values(&Criteria::empty(), "tags")
            .unwrap();
        assert_eq!(values, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn clones_share_data() {
        let store = MemoryStore::new();
        let alias = store.clone();
        store.seed("orders", vec![doc(json!({"n": 1}))]).unwrap();
        assert_eq!(alias.documents("orders").len(), 1);
    }
}
