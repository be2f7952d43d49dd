#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Daily price ingestion and history queries.
//!
//! This crate ties the provider adapters and the SQLite store together. It
//! re-exports the core types and provides:
//!
//! - [`ProviderRegistry`] - provider configuration and adapter construction by name
//! - [`IngestionCoordinator`] - the fetch, normalize and store pipeline for one symbol
//! - [`QueryService`] - validated history reads
//!
//! # Features
//!
//! - `alphavantage` - Alpha Vantage adapter
//! - `fmp` - Financial Modeling Prep adapter
//! - `frame` - `QueryService::history_frame` returning a polars `DataFrame`

// Core types and traits
pub use pricesync_core::*;

// Storage
pub use pricesync_sqlite::SqliteStore;

// Providers
#[cfg(feature = "alphavantage")]
pub use pricesync_alphavantage::{ALPHA_VANTAGE_BASE_URL, AlphaVantageFunction, AlphaVantageProvider};
#[cfg(feature = "fmp")]
pub use pricesync_fmp::{FMP_BASE_URL, FmpProvider};

mod coordinator;
mod query;
mod registry;

pub use coordinator::IngestionCoordinator;
pub use query::QueryService;
pub use registry::ProviderRegistry;

#[cfg(test)]
mod tests;
