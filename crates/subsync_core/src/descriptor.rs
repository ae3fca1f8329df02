//! Collection descriptors: the declarative input of a sync run.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One entry of the externally-supplied descriptor set.
///
/// Wire format (YAML): `collection` (required), `dependency`, `foreign_key`,
/// `reference_key`, `filters`. At most one of `foreign_key` /
/// `reference_key` may be set, and either requires `dependency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Name of the collection to synchronize. Unique across the set.
    #[serde(rename = "collection")]
    pub name: String,

    /// Name of another descriptor that must be fully processed first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,

    /// Field on *this* collection's documents matched against the
    /// dependency's synced identifiers (child references parent).
    #[serde(rename = "foreign_key", default, skip_serializing_if = "Option::is_none")]
    pub join_key: Option<String>,

    /// Field on the *dependency's destination* documents whose distinct
    /// values identify this collection's documents (parent references
    /// children).
    #[serde(rename = "reference_key", default, skip_serializing_if = "Option::is_none")]
    pub reverse_join_field: Option<String>,

    /// Raw filters, classified at normalization time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,
}

/// How a descriptor joins against its dependency, derived from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode<'a> {
    /// No join: filters alone select the documents. A dependency may still
    /// be present purely for ordering.
    Unjoined,
    /// Child documents carry this field pointing at parent identifiers.
    Forward(&'a str),
    /// Parent documents carry this field pointing at child identifiers.
    Reverse(&'a str),
}

impl CollectionDescriptor {
    /// Creates a descriptor with no dependency, joins, or filters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependency: None,
            join_key: None,
            reverse_join_field: None,
            filters: BTreeMap::new(),
        }
    }

    /// Sets the dependency collection name.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// Sets the forward-join key.
    #[must_use]
    pub fn with_join_key(mut self, key: impl Into<String>) -> Self {
        self.join_key = Some(key.into());
        self
    }

    /// Sets the reverse-join field.
    #[must_use]
    pub fn with_reverse_join_field(mut self, field: impl Into<String>) -> Self {
        self.reverse_join_field = Some(field.into());
        self
    }

    /// Adds a raw filter for a field.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    /// Returns the join mode implied by the descriptor's shape.
    ///
    /// # Errors
    ///
    /// Fails if both join fields are set, or a join field is set without a
    /// dependency.
    pub fn join_mode(&self) -> SyncResult<JoinMode<'_>> {
        match (self.join_key.as_deref(), self.reverse_join_field.as_deref()) {
            (Some(_), Some(_)) => Err(SyncError::invalid_descriptor(
                &self.name,
                "foreign_key and reference_key are mutually exclusive",
            )),
            (Some(key), None) => {
                self.require_dependency("foreign_key")?;
                Ok(JoinMode::Forward(key))
            }
            (None, Some(field)) => {
                self.require_dependency("reference_key")?;
                Ok(JoinMode::Reverse(field))
            }
            (None, None) => Ok(JoinMode::Unjoined),
        }
    }

    /// Validates the descriptor's shape.
    pub fn validate(&self) -> SyncResult<()> {
        if self.name.is_empty() {
            return Err(SyncError::invalid_descriptor(
                "<unnamed>",
                "collection name must not be empty",
            ));
        }
        self.join_mode().map(|_| ())
    }

    fn require_dependency(&self, join_field: &str) -> SyncResult<()> {
        if self.dependency.is_none() {
            return Err(SyncError::invalid_descriptor(
                &self.name,
                format!("{join_field} requires a dependency"),
            ));
        }
        Ok(())
    }
}

/// The full, ordered descriptor set for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorSet {
    descriptors: Vec<CollectionDescriptor>,
}

impl DescriptorSet {
    /// Creates a descriptor set from a list of descriptors.
    #[must_use]
    pub fn new(descriptors: Vec<CollectionDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Parses a descriptor set from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not a YAML list of
    /// descriptor records.
    pub fn from_yaml_str(text: &str) -> SyncResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| SyncError::configuration(format!("malformed descriptor set: {e}")))
    }

    /// Validates every descriptor's shape and checks name uniqueness.
    ///
    /// Dangling dependency references are not checked here; they surface as
    /// a scheduling error, together with cycles.
    pub fn validate(&self) -> SyncResult<()> {
        let mut seen = BTreeSet::new();
        for descriptor in &self.descriptors {
            descriptor.validate()?;
            if !seen.insert(descriptor.name.as_str()) {
                return Err(SyncError::invalid_descriptor(
                    &descriptor.name,
                    "duplicate collection name",
                ));
            }
        }
        Ok(())
    }

    /// Looks up a descriptor by collection name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Returns an iterator over the descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CollectionDescriptor> {
        self.descriptors.iter()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
