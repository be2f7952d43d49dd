#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for daily price ingestion.
//!
//! This crate provides the foundational abstractions shared by adapters, storage
//! and services:
//!
//! - [`DailyPriceProvider`](provider::DailyPriceProvider) - Fetches normalized daily bars
//! - [`PriceStore`](store::PriceStore) - Transactional upsert and range reads
//! - [`ProviderClient`](client::ProviderClient) - Shared HTTP fetch and error classification
//! - [`SyncError`](error::SyncError) - Error taxonomy for the whole pipeline

/// Shared HTTP client for provider adapters.
pub mod client;
/// Error types for ingestion and queries.
pub mod error;
/// Lenient JSON field extraction.
pub mod normalize;
/// Provider traits for fetching daily prices.
pub mod provider;
/// Storage trait for price history.
pub mod store;
/// Core data types (Symbol, PriceBar, Company, etc.).
pub mod types;

/// Polars conversion of price history.
#[cfg(feature = "frame")]
pub mod frame;

// Re-export commonly used items at crate root
pub use client::{ErrorKeys, ProviderClient, default_http_client};
pub use error::{ErrorKind, Result, SyncError};
pub use provider::{DailyPriceProvider, DataProvider};
pub use store::PriceStore;
pub use types::{Company, DateRange, PriceBar, ProviderConfig, Symbol, UNSET_DATE};
