#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! HTTP service for daily price ingestion and history queries.

/// Routes and handlers.
pub mod api;
/// Environment configuration.
pub mod config;
/// HTTP error mapping.
pub mod error;
/// Shared state, tracing and startup wiring.
pub mod state;

pub use api::app_router;
pub use config::Config;
pub use state::{AppState, build_state, init_tracing};
