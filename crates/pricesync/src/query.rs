//! Validated reads of stored price history.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use pricesync_core::{DateRange, PriceBar, PriceStore, Result, Symbol, SyncError};

/// Read side of the store: validates requests before touching storage.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn PriceStore>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService").finish_non_exhaustive()
    }
}

impl QueryService {
    /// Create a query service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Bars of `symbol` dated within `[start, end]`, newest first.
    ///
    /// # Errors
    /// - [`SyncError::Validation`] for a blank symbol, an unset date or `start > end`
    /// - [`SyncError::NotFound`] when nothing is stored in the range
    /// - [`SyncError::Service`] wrapping a storage failure
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let symbol = Symbol::parse(symbol)?;
        let range = DateRange::new(start, end)?;

        let bars = self
            .store
            .query_range(&symbol, range.start(), range.end())
            .await
            .map_err(|e| e.into_service("retrieving price history"))?;

        // A symbol that was never ingested and an empty window look the same here.
        if bars.is_empty() {
            return Err(SyncError::not_found("Symbol", &symbol));
        }
        debug!(symbol = %symbol, count = bars.len(), "loaded history");
        Ok(bars)
    }

    /// Every symbol with stored prices, ascending.
    ///
    /// # Errors
    /// [`SyncError::Service`] wrapping a storage failure.
    pub async fn symbols(&self) -> Result<Vec<Symbol>> {
        self.store
            .distinct_symbols()
            .await
            .map_err(|e| e.into_service("listing symbols"))
    }

    /// Like [`history`](Self::history), as a polars `DataFrame` with a `Date` column.
    ///
    /// # Errors
    /// As [`history`](Self::history).
    #[cfg(feature = "frame")]
    pub async fn history_frame(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<polars::prelude::DataFrame> {
        let bars = self.history(symbol, start, end).await?;
        pricesync_core::frame::bars_to_frame(&bars)
    }
}
