//! Storage trait for persisted price history.
//!
//! This module defines the [`PriceStore`] trait that the ingestion coordinator writes
//! through and the query service reads from.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::Result,
    types::{Company, PriceBar, Symbol},
};

/// Relational store for companies and their daily price bars.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Writes `bars` as one atomic unit.
    ///
    /// Every bar is validated before anything is written; a single invalid bar
    /// aborts the whole batch. Missing companies are created with the symbol as
    /// placeholder name. Rows are keyed by `(company_id, date, source)`: an existing
    /// row has its price fields and update time overwritten.
    ///
    /// Returns the number of input records processed.
    async fn upsert(&self, bars: &[PriceBar]) -> Result<usize>;

    /// Returns the bars of `symbol` dated within `[start, end]`, newest first.
    ///
    /// An empty vector (not an error) when nothing matches.
    async fn query_range(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>>;

    /// Returns every symbol with at least one stored bar, in ascending order.
    async fn distinct_symbols(&self) -> Result<Vec<Symbol>>;

    /// Looks up a company by symbol.
    async fn company(&self, symbol: &Symbol) -> Result<Option<Company>>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;
}
