#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Record store implementations for exported canonical records.
//!
//! This crate provides implementations of the [`RecordStore`] trait from `facts-core`:
//!
//! - [`JsonFileStore`] - JSON dataset directory with a manifest
//! - [`SqliteStore`] - Persistent SQLite-based store (default, requires `sqlite` feature)
//! - [`InMemoryStore`] - Simple in-memory store for testing
//! - [`NoopStore`] - No-op store that doesn't persist anything

/// JSON dataset file store.
pub mod json;
/// In-memory store implementation.
pub mod memory;
/// No-op store implementation.
pub mod noop;

/// SQLite-based store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use facts_core::RecordStore;

// Re-export implementations
pub use json::{DATASET_PATH_ENV, DatasetManifest, JsonFileStore, MANIFEST_FILE};
pub use memory::InMemoryStore;
pub use noop::NoopStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
