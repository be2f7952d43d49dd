#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SQLite storage for companies and daily price bars.
//!
//! - [`SqliteStore`] - Transactional [`PriceStore`] backed by a single connection

/// Table and index definitions.
mod schema;
/// SQLite-backed price store.
pub mod store;

// Re-export the trait for convenience
pub use pricesync_core::PriceStore;

pub use store::SqliteStore;
