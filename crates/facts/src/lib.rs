#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Canonical financial records from EDINET XBRL filings.
//!
//! This crate re-exports the core types, the EDINET resolution engine and the
//! record stores. It provides a [`FilingFetcher`] for retrieving filings from
//! EDINET and a [`FilingPipeline`] for resolving many filings with independent
//! per-filing outcomes.
//!
//! # Features
//!
//! - `cache-sqlite` - SQLite-based record store
//!
//! # Example
//!
//! ```rust,ignore
//! use facts::{FilingPipeline, PipelineConfig, collect_instance_files};
//!
//! #[tokio::main]
//! async fn main() -> facts::Result<()> {
//!     let config = PipelineConfig::from_env()?;
//!     let pipeline = FilingPipeline::from_config(&config);
//!
//!     let files = collect_instance_files(&["raw_xbrl".into()])?;
//!     let report = pipeline.process_paths(&files).await;
//!     println!("{} resolved, {} failed", report.succeeded(), report.failed());
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use facts_core::*;

// Resolution engine and EDINET client
pub use facts_edinet::{EdinetClient, EdinetProcessor, extract_instances};

// Store implementations
#[cfg(feature = "cache-sqlite")]
pub use facts_store::SqliteStore;
pub use facts_store::{DatasetManifest, InMemoryStore, JsonFileStore, NoopStore};

/// Pipeline configuration.
pub mod config;
mod fetch;
/// DataFrame conversion.
pub mod frame;
mod pipeline;

pub use config::{FetchConfig, PipelineConfig};
pub use fetch::{FetchOutcome, FetchReport, FilingFetcher, today_jst};
pub use frame::{records_to_frame, write_parquet};
pub use pipeline::{BatchReport, FilingOutcome, FilingPipeline, collect_instance_files};
