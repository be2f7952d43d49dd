//! Core data types for daily price ingestion.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`PriceBar`] - The canonical daily price record every adapter produces
//! - [`Company`] - The company a price series belongs to
//! - [`DateRange`] - Inclusive calendar date range used by history queries
//! - [`ProviderConfig`] - Base URL and API key of a provider

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SyncError};

/// Marks a date that was never set. Every real trading day compares greater.
pub const UNSET_DATE: NaiveDate = NaiveDate::MIN;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation, including when deserialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Creates a symbol, rejecting blank input.
    ///
    /// # Errors
    /// Returns [`SyncError::Validation`] if `s` is empty or whitespace.
    pub fn parse(s: &str) -> Result<Self> {
        let symbol = Self::new(s);
        if symbol.is_empty() {
            return Err(SyncError::validation(
                "Symbol",
                "symbol",
                "symbol cannot be empty",
            ));
        }
        Ok(symbol)
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is already trimmed and uppercased.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.0.trim() == self.0 && self.0.to_uppercase() == self.0
    }

    /// Returns true if the symbol is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The canonical daily price bar.
///
/// Every provider adapter maps its wire format to this record and the store persists
/// it keyed by `(company_id, date, source)`. A zero price means "unknown".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Owning company; `0` until resolved by the store.
    pub company_id: i64,
    /// Uppercased ticker.
    pub symbol: Symbol,
    /// Trading day. [`UNSET_DATE`] marks an unset date.
    pub date: NaiveDate,
    /// Opening price.
    #[serde(rename = "open_price")]
    pub open: f64,
    /// Highest price of the day.
    #[serde(rename = "high_price")]
    pub high: f64,
    /// Lowest price of the day.
    #[serde(rename = "low_price")]
    pub low: f64,
    /// Closing price.
    #[serde(rename = "close_price")]
    pub close: f64,
    /// Split/dividend adjusted closing price.
    pub adjusted_close: f64,
    /// Traded volume.
    pub volume: f64,
    /// Dividend paid on this day.
    pub dividend_amount: f64,
    /// Split coefficient for this day (1 when no split).
    pub split_coefficient: f64,
    /// Name of the provider that produced the bar.
    #[serde(rename = "data_source")]
    pub source: String,
    /// When the bar was normalized (or last written, when read back).
    pub last_updated: DateTime<Utc>,
}

impl PriceBar {
    /// Creates a bar with the required fields.
    ///
    /// Adjusted close defaults to `close`, dividend to `0` and split coefficient to `1`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        source: impl Into<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            company_id: 0,
            symbol,
            date,
            open,
            high,
            low,
            close,
            adjusted_close: close,
            volume,
            dividend_amount: 0.0,
            split_coefficient: 1.0,
            source: source.into(),
            last_updated,
        }
    }

    /// Sets the adjusted close price.
    #[must_use]
    pub const fn with_adjusted_close(mut self, adjusted_close: f64) -> Self {
        self.adjusted_close = adjusted_close;
        self
    }

    /// Sets the dividend amount.
    #[must_use]
    pub const fn with_dividend(mut self, dividend_amount: f64) -> Self {
        self.dividend_amount = dividend_amount;
        self
    }

    /// Sets the split coefficient.
    #[must_use]
    pub const fn with_split_coefficient(mut self, split_coefficient: f64) -> Self {
        self.split_coefficient = split_coefficient;
        self
    }

    /// Checks the record against the data-model invariants.
    ///
    /// # Errors
    /// Returns [`SyncError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fail = |field: &str, message: &str| Err(SyncError::validation("PriceBar", field, message));

        if self.symbol.is_empty() {
            return fail("symbol", "symbol is required");
        }
        if !self.symbol.is_normalized() {
            return fail("symbol", "symbol must be trimmed and uppercase");
        }
        if self.company_id < 0 {
            return fail("company_id", "company_id cannot be negative");
        }
        if self.date == UNSET_DATE {
            return fail("date", "date cannot be empty");
        }
        if self.source.trim().is_empty() {
            return fail("data_source", "data source is required");
        }

        let amounts = [
            ("open_price", self.open),
            ("high_price", self.high),
            ("low_price", self.low),
            ("close_price", self.close),
            ("adjusted_close", self.adjusted_close),
            ("volume", self.volume),
            ("dividend_amount", self.dividend_amount),
            ("split_coefficient", self.split_coefficient),
        ];
        for (field, value) in amounts {
            if !value.is_finite() {
                return fail(field, "value must be a finite number");
            }
            if value < 0.0 {
                return fail(field, "value cannot be negative");
            }
        }

        // Zero means "unknown" and is exempt from the ordering check.
        if self.high > 0.0 && self.low > 0.0 && self.high < self.low {
            return fail("price_range", "high price cannot be less than low price");
        }

        Ok(())
    }
}

impl fmt::Display for PriceBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceBar{{Symbol: {}, Date: {}, Open: {:.2}, High: {:.2}, Low: {:.2}, Close: {:.2}, Volume: {:.0}, Source: {}}}",
            self.symbol,
            self.date,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.source
        )
    }
}

/// A company owning a price series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Store-assigned identifier.
    pub company_id: i64,
    /// Unique ticker symbol.
    pub symbol: Symbol,
    /// Display name; the symbol itself when auto-created during ingestion.
    pub name: String,
    /// Whether the company is active.
    pub is_active: bool,
    /// When the company row was created.
    pub created_at: DateTime<Utc>,
}

/// Inclusive calendar date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting unset bounds and `start > end`.
    ///
    /// # Errors
    /// Returns [`SyncError::Validation`] for an invalid range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start == UNSET_DATE || end == UNSET_DATE {
            return Err(SyncError::validation(
                "DateRange",
                "date_range",
                "dates cannot be empty",
            ));
        }
        if start > end {
            return Err(SyncError::validation(
                "DateRange",
                "date_range",
                "start date cannot be after end date",
            ));
        }
        Ok(Self { start, end })
    }

    /// The `days`-long window ending at `end` (inclusive of both bounds).
    #[must_use]
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .filter(|start| *start > UNSET_DATE)
            .or_else(|| UNSET_DATE.succ_opt())
            .unwrap_or(end);
        Self { start, end }
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Connection settings of a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the provider API.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
}

impl ProviderConfig {
    /// Creates a provider configuration.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
