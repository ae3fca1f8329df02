//! Error types for sync runs.

use crate::store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync run.
///
/// Every variant is fatal to the run. Documents already written to the
/// destination for earlier descriptors are left in place; the error message
/// names the descriptor and store operation so a partial run can be
/// diagnosed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or missing run configuration (connection URIs, descriptor
    /// source).
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A descriptor is structurally invalid.
    #[error("invalid descriptor for collection {collection}: {message}")]
    InvalidDescriptor {
        /// Name of the offending collection descriptor.
        collection: String,
        /// Description of the problem.
        message: String,
    },

    /// The dependency forest contains a cycle or a reference to a
    /// non-existent collection name: a full readiness pass produced no
    /// newly-ready descriptor while some remained pending.
    #[error("scheduling stalled, no descriptor among {remaining:?} can become ready (cycle or unknown dependency)")]
    Scheduling {
        /// Names of the descriptors that never became ready.
        remaining: Vec<String>,
    },

    /// A filter value on an identifier field does not parse as an
    /// identifier.
    #[error("invalid identifier in filter field {field:?}: {value:?}")]
    InvalidIdentifier {
        /// The filter field name.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// The destination collection already holds documents and the run is
    /// configured to refuse overwriting.
    #[error("destination collection {collection} already contains {count} documents")]
    DestinationNotEmpty {
        /// The non-empty destination collection.
        collection: String,
        /// Number of documents found.
        count: u64,
    },

    /// A store operation failed while processing a descriptor.
    #[error("store error during {operation} on collection {collection}: {source}")]
    Store {
        /// The collection being processed.
        collection: String,
        /// The store operation that failed.
        operation: &'static str,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },

    /// Connecting to a store failed.
    #[error("store connection failed: {0}")]
    Connection(#[from] StoreError),
}

impl SyncError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid-descriptor error.
    pub fn invalid_descriptor(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-identifier error.
    pub fn invalid_identifier(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps a store error with the descriptor and operation it occurred in.
    pub fn store(collection: impl Into<String>, operation: &'static str, source: StoreError) -> Self {
        Self::Store {
            collection: collection.into(),
            operation,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_descriptor_and_operation() {
        let err = SyncError::store(
            "items",
            "insert_one",
            StoreError::malformed_document("items", "not an object"),
        );
        let text = err.to_string();
        assert!(text.contains("items"));
        assert!(text.contains("insert_one"));
    }

    #[test]
    fn scheduling_error_lists_remaining() {
        let err = SyncError::Scheduling {
            remaining: vec!["a".into(), "b".into()],
        };
        let text = err.to_string();
        assert!(text.contains("a"));
        assert!(text.contains("b"));
    }
}
