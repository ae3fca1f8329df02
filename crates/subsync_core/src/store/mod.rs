//! Generic document-store abstraction.
//!
//! The sync core never talks to a concrete database. It consumes the
//! [`Store`] / [`CollectionHandle`] trait pair, which a driver wrapper
//! implements. Two backends ship with the crate:
//!
//! - [`MemoryStore`] - for tests and ephemeral runs
//! - [`FileStore`] - JSON-lines files under a directory
//!
//! All operations are blocking; the run design is sequential.

mod file;
mod memory;

pub use file::{FileCollection, FileStore};
pub use memory::{MemoryCollection, MemoryStore};

use crate::document::{Document, DocumentId};
use crate::filter::Criteria;
use serde_json::Value;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure against the backing storage.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored record could not be decoded as a document.
    #[error("malformed document in collection {collection}: {message}")]
    MalformedDocument {
        /// The collection containing the record.
        collection: String,
        /// Description of the problem.
        message: String,
    },

    /// The connection URI has no recognized scheme.
    #[error("unsupported connection scheme {scheme:?} (expected memory:// or file://)")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// The connection URI is not parseable.
    #[error("invalid connection URI: {uri}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
    },
}

impl StoreError {
    /// Creates a malformed-document error.
    pub fn malformed_document(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            collection: collection.into(),
            message: message.into(),
        }
    }
}

/// A connected document store.
///
/// A store hands out [`CollectionHandle`]s by name. Collections need not
/// exist in advance; reading a missing collection yields no documents and
/// writing to one creates it.
pub trait Store {
    /// The collection handle type.
    type Collection: CollectionHandle;

    /// Returns a handle for the named collection.
    fn collection(&self, name: &str) -> Self::Collection;
}

/// Operations on one collection of a store.
///
/// # Invariants
///
/// - `find` returns a finite, lazy sequence; it is not restartable without
///   calling `find` again
/// - `insert_one` assigns a fresh identifier when the document lacks one,
///   and returns the identifier the document was stored under
/// - `distinct_values` returns each value at most once
pub trait CollectionHandle {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Finds documents matching the criteria.
    fn find(&self, criteria: &Criteria) -> StoreResult<Cursor>;

    /// Counts documents matching the criteria.
    fn count(&self, criteria: &Criteria) -> StoreResult<u64>;

    /// Inserts one document, returning its identifier.
    fn insert_one(&self, document: Document) -> StoreResult<DocumentId>;

    /// Deletes all documents matching the criteria, returning the count.
    fn delete_many(&self, criteria: &Criteria) -> StoreResult<u64>;

    /// Returns the distinct values of `field` across documents matching
    /// the criteria. Documents lacking the field contribute nothing;
    /// array-valued fields contribute each element.
    fn distinct_values(&self, criteria: &Criteria, field: &str) -> StoreResult<Vec<Value>>;
}

/// A finite, lazy sequence of documents produced by a find.
pub struct Cursor {
    inner: Box<dyn Iterator<Item = StoreResult<Document>>>,
}

impl Cursor {
    /// Wraps an iterator of document results.
    pub fn new(inner: impl Iterator<Item = StoreResult<Document>> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Wraps an already-materialized batch of documents.
    #[must_use]
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::new(documents.into_iter().map(Ok))
    }
}

impl Iterator for Cursor {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cursor")
    }
}

/// A store selected at runtime from a connection URI.
#[derive(Debug, Clone)]
pub enum AnyStore {
    /// An in-memory store.
    Memory(MemoryStore),
    /// A directory-backed store.
    File(FileStore),
}

/// A collection handle of an [`AnyStore`].
#[derive(Debug)]
pub enum AnyCollection {
    /// Handle into an in-memory store.
    Memory(MemoryCollection),
    /// Handle into a directory-backed store.
    File(FileCollection),
}

impl Store for AnyStore {
    type Collection = AnyCollection;

    fn collection(&self, name: &str) -> AnyCollection {
        match self {
            Self::Memory(store) => AnyCollection::Memory(store.collection(name)),
            Self::File(store) => AnyCollection::File(store.collection(name)),
        }
    }
}

impl CollectionHandle for AnyCollection {
    fn name(&self) -> &str {
        match self {
            Self::Memory(c) => c.name(),
            Self::File(c) => c.name(),
        }
    }

    fn find(&self, criteria: &Criteria) -> StoreResult<Cursor> {
        match self {
            Self::Memory(c) => c.find(criteria),
            Self::File(c) => c.find(criteria),
        }
    }

    fn count(&self, criteria: &Criteria) -> StoreResult<u64> {
        match self {
            Self::Memory(c) => c.count(criteria),
            Self::File(c) => c.count(criteria),
        }
    }

    fn insert_one(&self, document: Document) -> StoreResult<DocumentId> {
        match self {
            Self::Memory(c) => c.insert_one(document),
            Self::File(c) => c.insert_one(document),
        }
    }

    fn delete_many(&self, criteria: &Criteria) -> StoreResult<u64> {
        match self {
            Self::Memory(c) => c.delete_many(criteria),
            Self::File(c) => c.delete_many(criteria),
        }
    }

    fn distinct_values(&self, criteria: &Criteria, field: &str) -> StoreResult<Vec<Value>> {
        match self {
            Self::Memory(c) => c.distinct_values(criteria, field),
            Self::File(c) => c.distinct_values(criteria, field),
        }
    }
}

/// Connects to a store named by URI.
///
/// Supported schemes:
/// - `memory://` - a fresh in-memory store
/// - `file:///path/to/dir` - a directory of JSON-lines collection files,
///   created if missing
pub fn connect(uri: &str) -> StoreResult<AnyStore> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(StoreError::InvalidUri { uri: uri.into() });
    };
    match scheme {
        "memory" => Ok(AnyStore::Memory(MemoryStore::new())),
        "file" => {
            if rest.is_empty() {
                return Err(StoreError::InvalidUri { uri: uri.into() });
            }
            Ok(AnyStore::File(FileStore::open(rest)?))
        }
        other => Err(StoreError::UnsupportedScheme {
            scheme: other.into(),
        }),
    }
}

// Extracts the distinct values of `field` from documents matching the
// criteria. Shared by the shipped backends.
fn distinct_from_documents<'a>(
    documents: impl Iterator<Item = &'a Document>,
    criteria: &Criteria,
    field: &str,
) -> Vec<Value> {
    let mut values = Vec::new();
    for document in documents.filter(|d| criteria.matches(d)) {
        match document.get(field) {
            Some(Value::Array(items)) => {
                for item in items {
                    if !values.contains(item) {
                        values.push(item.clone());
                    }
                }
            }
            Some(value) => {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
            None => {}
        }
    }
    values
}

// Assigns or validates the identifier on a document being inserted.
fn prepare_insert(collection: &str, document: &mut Document) -> StoreResult<DocumentId> {
    match document.get(crate::document::ID_FIELD) {
        None => {
            let id = DocumentId::new();
            document.set_id(id);
            Ok(id)
        }
        Some(Value::String(s)) => s.parse().map_err(|_| {
            StoreError::malformed_document(collection, format!("unparseable _id {s:?}"))
        }),
        Some(other) => Err(StoreError::malformed_document(
            collection,
            format!("non-string _id: {other}"),
        )),
    }
}
