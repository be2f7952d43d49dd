//! Pipeline tests against stub provider servers.

#![cfg(all(feature = "alphavantage", feature = "fmp"))]

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use crate::{
    ErrorKind, IngestionCoordinator, ProviderRegistry, QueryService, SqliteStore, Symbol,
    default_http_client,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

#[tokio::test]
async fn test_alpha_vantage_to_history() {
    let base = serve(Router::new().route(
        "/query",
        get(|| async {
            Json(json!({
                "Time Series (Daily)": {
                    "2024-01-02": {"1. open": "10", "2. high": "12", "3. low": "9",
                                   "4. close": "11", "5. volume": "1000"}
                }
            }))
        }),
    ))
    .await;

    let registry = ProviderRegistry::new(default_http_client().unwrap()).with_provider(
        "AlphaVantage",
        format!("{base}/query"),
        "demo",
    );
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let provider = registry.create("alphavantage").unwrap();
    let coordinator = IngestionCoordinator::new(provider, store.clone());

    assert_eq!(coordinator.synchronize("ABC").await.unwrap(), 1);

    let history = QueryService::new(store)
        .history("ABC", date(1), date(31))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    let bar = &history[0];
    assert_eq!(bar.symbol, Symbol::new("ABC"));
    assert_eq!(bar.date, date(2));
    assert_eq!(bar.high, 12.0);
    assert_eq!(bar.low, 9.0);
    assert!(bar.high >= bar.low);
    assert_eq!(bar.source, "AlphaVantage");
}

#[tokio::test]
async fn test_bare_keyed_series_to_history() {
    let base = serve(Router::new().route(
        "/query",
        get(|| async {
            Json(json!({
                "Time Series (Daily)": {
                    "2024-01-02": {"open": "10", "high": "12", "low": "9",
                                   "close": "11", "volume": "1000"}
                }
            }))
        }),
    ))
    .await;

    let registry = ProviderRegistry::new(default_http_client().unwrap()).with_provider(
        "AlphaVantage",
        format!("{base}/query"),
        "demo",
    );
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let provider = registry.create("AlphaVantage").unwrap();
    let coordinator = IngestionCoordinator::new(provider, store.clone());

    assert_eq!(coordinator.synchronize("ABC").await.unwrap(), 1);

    let history = QueryService::new(store)
        .history("ABC", date(1), date(3))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    let bar = &history[0];
    assert_eq!(bar.date, date(2));
    assert_eq!((bar.open, bar.high, bar.low, bar.close), (10.0, 12.0, 9.0, 11.0));
    assert_eq!(bar.volume, 1000.0);
    assert_eq!(bar.source, "AlphaVantage");
}

#[tokio::test]
async fn test_provider_rejection_stores_nothing() {
    let base = serve(Router::new().route(
        "/stable/historical-price-eod/full",
        get(|| async { Json(json!({"Error Message": "Invalid API KEY."})) }),
    ))
    .await;

    let registry =
        ProviderRegistry::new(default_http_client().unwrap()).with_provider("FMP", base, "bad");
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let coordinator = IngestionCoordinator::new(registry.create("fmp").unwrap(), store.clone());

    let err = coordinator.synchronize("ABC").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.root_cause().kind(), ErrorKind::Provider);

    let err = QueryService::new(store)
        .history("ABC", date(1), date(31))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_adapters_normalize_the_same_bar_identically() {
    let symbol = Symbol::new("IBM");
    let fetched_at = Utc::now();

    let av = json!({
        "Time Series (Daily)": {
            "2024-01-02": {"1. open": "10.5", "2. high": "12", "3. low": "9.25",
                           "4. close": "11", "5. volume": "1000"}
        }
    });
    let fmp = json!([
        {"symbol": "IBM", "date": "2024-01-02", "open": 10.5, "high": 12.0, "low": 9.25,
         "close": 11.0, "volume": 1000}
    ]);

    let from_av =
        pricesync_alphavantage::parse_time_series(&symbol, av.as_object().unwrap(), fetched_at)
            .unwrap();
    let from_fmp = pricesync_fmp::parse_history(&symbol, fmp.as_array().unwrap(), fetched_at);

    assert_eq!(from_av.len(), 1);
    assert_eq!(from_fmp.len(), 1);
    assert_eq!(from_av[0].source, "AlphaVantage");
    assert_eq!(from_fmp[0].source, "FMP");

    let mut relabelled = from_fmp[0].clone();
    relabelled.source = from_av[0].source.clone();
    assert_eq!(relabelled, from_av[0]);
}
