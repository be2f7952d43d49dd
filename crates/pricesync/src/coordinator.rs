//! Fetch, normalize and store the full daily history of one symbol.

use std::sync::Arc;

use tracing::{debug, instrument};

use pricesync_core::{
    DailyPriceProvider, DataProvider, ErrorKind, PriceStore, Result, Symbol, SyncError,
};

/// Runs one synchronization: a single provider fetch followed by one atomic upsert.
///
/// There are no retries; a failed run leaves the store untouched.
#[derive(Clone)]
pub struct IngestionCoordinator {
    provider: Arc<dyn DailyPriceProvider>,
    store: Arc<dyn PriceStore>,
}

impl std::fmt::Debug for IngestionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionCoordinator")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl IngestionCoordinator {
    /// Create a coordinator writing bars from `provider` into `store`.
    #[must_use]
    pub fn new(provider: Arc<dyn DailyPriceProvider>, store: Arc<dyn PriceStore>) -> Self {
        Self { provider, store }
    }

    /// Name of the provider this coordinator fetches from.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch the daily history of `symbol` and store it.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    /// - [`SyncError::Validation`] for a blank symbol or an invalid fetched record
    /// - [`SyncError::NotFound`] when the provider returned no records
    /// - [`SyncError::Service`] wrapping any fetch or storage failure
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn synchronize(&self, symbol: &str) -> Result<usize> {
        let symbol = Symbol::parse(symbol)?;

        let bars = self
            .provider
            .fetch_daily(&symbol)
            .await
            .map_err(|e| e.into_service("fetching price data"))?;

        if bars.is_empty() {
            return Err(SyncError::not_found("Symbol", &symbol));
        }
        debug!(symbol = %symbol, count = bars.len(), "fetched daily bars");

        let written = self.store.upsert(&bars).await.map_err(|e| match e.kind() {
            ErrorKind::Validation => e,
            _ => e.into_service("storing price data"),
        })?;

        debug!(symbol = %symbol, written, "stored daily bars");
        Ok(written)
    }
}
