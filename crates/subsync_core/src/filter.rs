//! Filter normalization: raw descriptor filters into store query criteria.

use crate::document::{Document, DocumentId};
use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// Returns true if a filter field names a document identifier by
/// convention: the reserved `_id` field or any field ending in `_id`.
#[must_use]
pub fn is_identifier_field(field: &str) -> bool {
    field.ends_with("_id")
}

/// A raw filter value, classified exactly once at normalization time.
///
/// Classification depends on both the value and the field name it is
/// attached to, so it cannot happen during deserialization; descriptors
/// carry plain JSON values until [`normalize`] runs.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A scalar compared for equality.
    Scalar(Value),
    /// A string on an identifier-named field, to be coerced into the
    /// native identifier representation.
    IdentifierText(String),
    /// A list denoting set membership.
    List(Vec<Value>),
}

impl FilterValue {
    /// Classifies a raw filter value for the given field.
    #[must_use]
    pub fn classify(field: &str, value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items),
            Value::String(text) if is_identifier_field(field) => Self::IdentifierText(text),
            other => Self::Scalar(other),
        }
    }
}

/// A single-field query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The field value equals this value.
    Eq(Value),
    /// The field value is a member of this list.
    In(Vec<Value>),
}

impl Predicate {
    /// Evaluates the predicate against a field value (`None` = field
    /// absent). An absent field matches nothing.
    #[must_use]
    pub fn matches(&self, candidate: Option<&Value>) -> bool {
        match (self, candidate) {
            (Self::Eq(expected), Some(actual)) => expected == actual,
            (Self::In(members), Some(actual)) => members.contains(actual),
            (_, None) => false,
        }
    }
}

/// AND-combined query criteria: one predicate per field.
///
/// An empty criteria set matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    predicates: BTreeMap<String, Predicate>,
}

impl Criteria {
    /// Creates criteria that match every document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a predicate for a field, replacing any existing one.
    pub fn insert(&mut self, field: impl Into<String>, predicate: Predicate) {
        self.predicates.insert(field.into(), predicate);
    }

    /// Builder form of [`Criteria::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.insert(field, predicate);
        self
    }

    /// Returns the predicate for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Predicate> {
        self.predicates.get(field)
    }

    /// Returns true if no predicates are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the number of predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Evaluates all predicates against a document (logical AND).
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.predicates
            .iter()
            .all(|(field, predicate)| predicate.matches(document.get(field)))
    }

    /// Returns an iterator over the predicates.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.predicates.iter()
    }
}

/// Normalizes raw descriptor filters into query criteria.
///
/// Rules, applied per field:
/// 1. A string value on an identifier-named field is coerced through
///    [`DocumentId`] parsing into canonical form; a malformed string fails
///    with [`SyncError::InvalidIdentifier`].
/// 2. A list becomes a membership predicate; on identifier fields its
///    string elements are coerced the same way.
/// 3. Any other scalar becomes an equality predicate, unchanged.
///
/// The function is pure, order-independent across fields, and idempotent:
/// normalizing already-canonical values yields identical criteria.
pub fn normalize(filters: &BTreeMap<String, Value>) -> SyncResult<Criteria> {
    let mut criteria = Criteria::empty();
    for (field, raw) in filters {
        let predicate = match FilterValue::classify(field, raw.clone()) {
            FilterValue::Scalar(value) => Predicate::Eq(value),
            FilterValue::IdentifierText(text) => Predicate::Eq(coerce_identifier(field, &text)?),
            FilterValue::List(items) => {
                let members = if is_identifier_field(field) {
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(text) => coerce_identifier(field, &text),
                            other => Ok(other),
                        })
                        .collect::<SyncResult<Vec<_>>>()?
                } else {
                    items
                };
                Predicate::In(members)
            }
        };
        criteria.insert(field.clone(), predicate);
    }
    Ok(criteria)
}

fn coerce_identifier(field: &str, text: &str) -> SyncResult<Value> {
    let id: DocumentId = text
        .parse()
        .map_err(|_| SyncError::invalid_identifier(field, text))?;
    Ok(id.to_value())
}
