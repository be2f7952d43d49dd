#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricesync/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial Modeling Prep (FMP) daily price adapter.
//!
//! This crate implements the pricesync-core provider traits for the
//! [Financial Modeling Prep](https://financialmodelingprep.com/) end-of-day
//! history endpoint.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pricesync_fmp::FmpProvider;
//! use pricesync_core::{DailyPriceProvider, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = FmpProvider::new("your_api_key")?;
//!
//!     let bars = provider.fetch_daily(&Symbol::new("AAPL")).await?;
//!     for bar in bars.iter().take(5) {
//!         println!("{bar}");
//!     }
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricesync_core::{
    DailyPriceProvider, DataProvider, PriceBar, ProviderClient, ProviderConfig, Result, Symbol,
    default_http_client,
    normalize::{field, optional_field, parse_date},
};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

/// Default FMP host.
pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com";

/// Provider name, used as the record source and registry key.
pub const PROVIDER_NAME: &str = "FMP";

/// Full end-of-day history, newest first.
const HISTORY_PATH: &str = "stable/historical-price-eod/full";

/// Financial Modeling Prep daily price provider.
#[derive(Clone, Debug)]
pub struct FmpProvider {
    http: ProviderClient,
}

impl FmpProvider {
    /// Create a new FMP provider with the given API key.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(default_http_client()?, api_key))
    }

    /// Create a new FMP provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_config(client, ProviderConfig::new(FMP_BASE_URL, api_key))
    }

    /// Create a provider against a different host, e.g. a proxy or test server.
    #[must_use]
    pub fn with_config(client: Client, config: ProviderConfig) -> Self {
        Self {
            http: ProviderClient::new(PROVIDER_NAME, client, config),
        }
    }

    fn history_url(&self, symbol: &Symbol) -> Result<Url> {
        self.http
            .build_url(HISTORY_PATH, &[("symbol", symbol.as_str())])
    }
}

impl DataProvider for FmpProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Financial Modeling Prep - End-of-day price history"
    }
}

#[async_trait]
impl DailyPriceProvider for FmpProvider {
    async fn fetch_daily(&self, symbol: &Symbol) -> Result<Vec<PriceBar>> {
        let url = self.history_url(symbol)?;
        let items = self.http.get_array(&url).await?;
        let bars = parse_history(symbol, &items, Utc::now());
        debug!(symbol = %symbol, count = bars.len(), "parsed FMP history");
        Ok(bars)
    }
}

/// Maps FMP history rows to canonical bars in the order FMP returned them.
///
/// Rows that are not objects or lack a valid `date` are skipped. FMP does not
/// report dividends or splits on this endpoint, so those keep their defaults.
#[must_use]
pub fn parse_history(symbol: &Symbol, items: &[Value], fetched_at: DateTime<Utc>) -> Vec<PriceBar> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|row| {
            let date = row.get("date").and_then(Value::as_str).and_then(parse_date)?;
            let close = field(row, &["close"], 0.0);
            let bar = PriceBar::new(
                symbol.clone(),
                date,
                field(row, &["open"], 0.0),
                field(row, &["high"], 0.0),
                field(row, &["low"], 0.0),
                close,
                field(row, &["volume"], 0.0),
                PROVIDER_NAME,
                fetched_at,
            )
            .with_adjusted_close(optional_field(row, &["adjClose"]).unwrap_or(close));
            Some(bar)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, routing::get};
    use chrono::NaiveDate;
    use pricesync_core::{ErrorKind, SyncError};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn history_payload() -> Value {
        json!([
            {"symbol": "AAPL", "date": "2024-01-03", "open": 184.22, "high": 185.88, "low": 183.43,
             "close": 184.25, "adjClose": 183.9, "volume": 58414500, "vwap": 184.52},
            {"symbol": "AAPL", "date": "2024-01-02", "open": "187.15", "high": "188.44", "low": "183.89",
             "close": "185.64", "volume": "82488700"},
            {"symbol": "AAPL", "date": "bad", "open": 1.0},
            "not an object"
        ])
    }

    #[test]
    fn test_provider_name() {
        let provider = FmpProvider::with_client(Client::new(), "test_key");
        assert_eq!(provider.name(), "FMP");
        assert!(!provider.description().is_empty());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = FmpProvider::with_client(Client::new(), "secret_key_12345");
        let debug_output = format!("{provider:?}");
        assert!(!debug_output.contains("secret_key_12345"));
        assert!(debug_output.contains("REDACTED"));
    }

    #[test]
    fn test_url_building() {
        let provider = FmpProvider::with_client(Client::new(), "test_key");
        let url = provider.history_url(&Symbol::new("aapl")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://financialmodelingprep.com/stable/historical-price-eod/full?symbol=AAPL&apikey=test_key"
        );
    }

    #[test]
    fn test_parse_history_preserves_order() {
        let symbol = Symbol::new("AAPL");
        let payload = history_payload();
        let bars = parse_history(&symbol, payload.as_array().unwrap(), Utc::now());

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        assert_eq!(bars[0].adjusted_close, 183.9);
        assert_eq!(bars[0].volume, 58_414_500.0);
        assert_eq!(bars[0].source, "FMP");

        // String-encoded numbers and a missing adjClose.
        assert_eq!(bars[1].open, 187.15);
        assert_eq!(bars[1].adjusted_close, 185.64);
        assert_eq!(bars[1].dividend_amount, 0.0);
        assert_eq!(bars[1].split_coefficient, 1.0);
    }

    #[tokio::test]
    async fn test_fetch_daily_over_http() {
        let router = Router::new().route(
            "/stable/historical-price-eod/full",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("symbol").map(String::as_str) {
                    Some("AAPL") => Json(history_payload()),
                    Some("EMPTY") => Json(json!([])),
                    Some("LIMIT") => Json(json!([{"error": "Limit Reach"}])),
                    _ => Json(json!({"Error Message": "Invalid API KEY"})),
                }
            }),
        );
        let base = serve(router).await;
        let provider = FmpProvider::with_config(
            default_http_client().unwrap(),
            ProviderConfig::new(base, "demo"),
        );

        let bars = provider.fetch_daily(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(bars.len(), 2);

        let bars = provider.fetch_daily(&Symbol::new("EMPTY")).await.unwrap();
        assert!(bars.is_empty());

        let err = provider.fetch_daily(&Symbol::new("LIMIT")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);

        let err = provider.fetch_daily(&Symbol::new("OTHER")).await.unwrap_err();
        assert!(matches!(err, SyncError::ProviderApi { ref message, .. } if message == "Invalid API KEY"));
    }
}
