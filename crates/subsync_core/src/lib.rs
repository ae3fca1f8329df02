//! # subsync core
//!
//! Dependency-ordered partial synchronization between document stores.
//!
//! subsync copies a declared subset of collections from a source store to a
//! destination store. A descriptor set names the collections, their
//! inter-collection dependencies, and per-collection filters; the scheduler
//! orders the set so every descriptor runs after its dependency, and the
//! extraction engine filters child collections by the identifiers of
//! already-copied parent documents.
//!
//! This crate provides:
//! - Collection descriptors and their YAML wire format
//! - Filter normalization into AND-combined query criteria
//! - The layered dependency scheduler and run driver
//! - The extraction engine with forward- and reverse-join batching
//! - A generic store abstraction with in-memory and file backends
//!
//! ## Key invariants
//!
//! - A descriptor never runs before its dependency has completed
//! - Join batching is lossless and duplicate-free: batched extraction
//!   equals one unbounded query over the full parent-identifier list
//! - Filter normalization is pure and idempotent
//! - The registry holds exactly the identifiers inserted during the run
//! - Execution is strictly sequential; any failure aborts the run with no
//!   rollback of documents already written
//!
//! ## Example
//!
//! ```rust
//! use subsync_core::{
//!     CollectionDescriptor, DescriptorSet, MemoryStore, Scheduler, SyncConfig,
//! };
//! use serde_json::json;
//!
//! let source = MemoryStore::new();
//! source
//!     .seed(
//!         "orders",
//!         vec![subsync_core::Document::from_json(json!({"status": "open"})).unwrap()],
//!     )
//!     .unwrap();
//! let dest = MemoryStore::new();
//!
//! let set = DescriptorSet::new(vec![
//!     CollectionDescriptor::new("orders").with_filter("status", json!("open")),
//! ]);
//! let stats = Scheduler::new(SyncConfig::new())
//!     .run(&set, &source, &dest)
//!     .unwrap();
//! assert_eq!(stats.total_inserted(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod descriptor;
mod document;
mod engine;
mod error;
mod filter;
mod registry;
mod scheduler;
pub mod store;

pub use config::{ExistingDataPolicy, SyncConfig, DEFAULT_BATCH_SIZE};
pub use descriptor::{CollectionDescriptor, DescriptorSet, JoinMode};
pub use document::{Document, DocumentId, ID_FIELD};
pub use engine::{CollectionStats, ExtractionEngine};
pub use error::{SyncError, SyncResult};
pub use filter::{is_identifier_field, normalize, Criteria, FilterValue, Predicate};
pub use registry::SyncedIdRegistry;
pub use scheduler::{schedule, RunStats, Scheduler};
pub use store::{
    connect, AnyCollection, AnyStore, CollectionHandle, Cursor, FileStore, MemoryStore, Store,
    StoreError, StoreResult,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
