#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage daily price adapter.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pricesync_alphavantage::AlphaVantageProvider;
//! use pricesync_core::{DailyPriceProvider, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AlphaVantageProvider::new("your_api_key")?;
//!     let bars = provider.fetch_daily(&Symbol::new("IBM")).await?;
//!     println!("newest bar: {}", bars[0]);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricesync_core::{
    DailyPriceProvider, DataProvider, ErrorKeys, PriceBar, ProviderClient, ProviderConfig, Result,
    Symbol, SyncError, default_http_client,
    normalize::{field, optional_field, parse_date},
};
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::debug;

/// Default Alpha Vantage query endpoint.
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Provider name, used as the record source and registry key.
pub const PROVIDER_NAME: &str = "AlphaVantage";

/// Key of the date-keyed series object in the response.
const TIME_SERIES_KEY: &str = "Time Series (Daily)";

/// Alpha Vantage reports rate limits and premium-only endpoints under these keys.
const EXTRA_ERROR_KEYS: &[&str] = &["Information", "Note"];

// Numbered keys come from the API; bare keys are accepted for hand-written payloads.
const OPEN_KEYS: &[&str] = &["1. open", "open"];
const HIGH_KEYS: &[&str] = &["2. high", "high"];
const LOW_KEYS: &[&str] = &["3. low", "low"];
const CLOSE_KEYS: &[&str] = &["4. close", "close"];
const ADJUSTED_CLOSE_KEYS: &[&str] = &["5. adjusted close", "adjusted close", "adjusted_close"];
const VOLUME_KEYS: &[&str] = &["6. volume", "5. volume", "volume"];
const DIVIDEND_KEYS: &[&str] = &["7. dividend amount", "dividend amount", "dividend_amount"];
const SPLIT_KEYS: &[&str] = &["8. split coefficient", "split coefficient", "split_coefficient"];

/// Which daily series endpoint to call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaVantageFunction {
    /// `TIME_SERIES_DAILY`: raw OHLCV, available on the free tier.
    #[default]
    Daily,
    /// `TIME_SERIES_DAILY_ADJUSTED`: adds adjusted close, dividends and splits.
    DailyAdjusted,
}

impl AlphaVantageFunction {
    /// The `function` query parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "TIME_SERIES_DAILY",
            Self::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
        }
    }
}

/// Alpha Vantage daily price provider.
#[derive(Clone, Debug)]
pub struct AlphaVantageProvider {
    http: ProviderClient,
    function: AlphaVantageFunction,
}

impl AlphaVantageProvider {
    /// Create a provider for the public endpoint with its own HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(default_http_client()?, api_key))
    }

    /// Create a provider for the public endpoint using a shared HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_config(client, ProviderConfig::new(ALPHA_VANTAGE_BASE_URL, api_key))
    }

    /// Create a provider with an explicit base URL and API key.
    #[must_use]
    pub fn with_config(client: Client, config: ProviderConfig) -> Self {
        let error_keys = ErrorKeys::default().with_object_keys(EXTRA_ERROR_KEYS.iter().copied());
        Self {
            http: ProviderClient::new(PROVIDER_NAME, client, config).with_error_keys(error_keys),
            function: AlphaVantageFunction::default(),
        }
    }

    /// Select the series endpoint.
    #[must_use]
    pub const fn with_function(mut self, function: AlphaVantageFunction) -> Self {
        self.function = function;
        self
    }

    /// Build the request URL for `symbol`.
    fn daily_url(&self, symbol: &Symbol) -> Result<Url> {
        self.http.build_url(
            "",
            &[
                ("function", self.function.as_str()),
                ("symbol", symbol.as_str()),
                ("outputsize", "full"),
            ],
        )
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Alpha Vantage - Daily time series from the Alpha Vantage query API"
    }
}

#[async_trait]
impl DailyPriceProvider for AlphaVantageProvider {
    async fn fetch_daily(&self, symbol: &Symbol) -> Result<Vec<PriceBar>> {
        let url = self.daily_url(symbol)?;
        let response = self.http.get_object(&url).await?;
        let bars = parse_time_series(symbol, &response, Utc::now())?;
        debug!(symbol = %symbol, count = bars.len(), "parsed Alpha Vantage series");
        Ok(bars)
    }
}

/// Maps an Alpha Vantage daily response to canonical bars, newest first.
///
/// Entries whose key is not a `YYYY-MM-DD` date, or whose value is not an object,
/// are skipped.
///
/// # Errors
/// Returns [`SyncError::ResponseParse`] if the series object is missing.
pub fn parse_time_series(
    symbol: &Symbol,
    response: &Map<String, Value>,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<PriceBar>> {
    let series = response
        .get(TIME_SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| {
            SyncError::ResponseParse(format!("could not find '{TIME_SERIES_KEY}' data in response"))
        })?;

    let mut bars: Vec<PriceBar> = series
        .iter()
        .filter_map(|(date, entry)| {
            let date = parse_date(date)?;
            let entry = entry.as_object()?;
            Some(to_bar(symbol, date, entry, fetched_at))
        })
        .collect();

    bars.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(bars)
}

fn to_bar(
    symbol: &Symbol,
    date: chrono::NaiveDate,
    entry: &Map<String, Value>,
    fetched_at: DateTime<Utc>,
) -> PriceBar {
    let close = field(entry, CLOSE_KEYS, 0.0);
    PriceBar::new(
        symbol.clone(),
        date,
        field(entry, OPEN_KEYS, 0.0),
        field(entry, HIGH_KEYS, 0.0),
        field(entry, LOW_KEYS, 0.0),
        close,
        field(entry, VOLUME_KEYS, 0.0),
        PROVIDER_NAME,
        fetched_at,
    )
    .with_adjusted_close(optional_field(entry, ADJUSTED_CLOSE_KEYS).unwrap_or(close))
    .with_dividend(field(entry, DIVIDEND_KEYS, 0.0))
    .with_split_coefficient(field(entry, SPLIT_KEYS, 1.0))
}
