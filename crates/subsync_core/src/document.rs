//! Document and document-identifier types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the reserved identifier field on every document.
pub const ID_FIELD: &str = "_id";

/// Unique identifier for a document.
///
/// Document IDs are 128-bit UUIDs. They travel inside documents as the
/// canonical hyphenated string under the [`ID_FIELD`] key, so a document
/// round-trips through serialization without a separate identifier channel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Converts to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the canonical string form (lowercase hyphenated).
    #[must_use]
    pub fn canonical(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Returns the identifier as a JSON string value, the form stored in
    /// documents and used in query criteria.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::String(self.canonical())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// A schemaless document: an ordered map of field names to JSON values.
///
/// Documents pass through the sync pipeline opaquely. The only field the
/// pipeline interprets is [`ID_FIELD`], plus whichever fields a descriptor
/// names in its filters or join keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from a JSON value.
    ///
    /// Returns `None` if the value is not a JSON object.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Returns the value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, replacing any existing value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Returns the document's identifier, if the [`ID_FIELD`] holds a
    /// well-formed identifier string.
    #[must_use]
    pub fn id(&self) -> Option<DocumentId> {
        match self.fields.get(ID_FIELD) {
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// Sets the document's identifier field.
    pub fn set_id(&mut self, id: DocumentId) {
        self.fields.insert(ID_FIELD.to_string(), id.to_value());
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over the document's fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.fields)
    }
}
