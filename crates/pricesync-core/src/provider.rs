//! Provider traits for fetching daily prices.
//!
//! - [`DataProvider`] - Base trait carrying provider metadata
//! - [`DailyPriceProvider`] - Fetches a symbol's daily series as canonical records

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{PriceBar, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "AlphaVantage").
    ///
    /// The name labels the `source` of every record the provider emits.
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider of daily price series.
#[async_trait]
pub trait DailyPriceProvider: DataProvider {
    /// Fetches the daily series for `symbol`, normalized to [`PriceBar`]s.
    ///
    /// Makes exactly one request. Entries with unparsable dates are skipped and
    /// unreadable numbers become `0`; neither fails the fetch. An empty vector
    /// means the provider returned no data.
    async fn fetch_daily(&self, symbol: &Symbol) -> Result<Vec<PriceBar>>;
}
