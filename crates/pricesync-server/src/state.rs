//! Shared application state and process-wide setup.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pricesync::{
    DailyPriceProvider, DataProvider, IngestionCoordinator, PriceStore, ProviderRegistry, QueryService,
    SqliteStore, default_http_client,
};

use crate::config::{Config, LogFormat};

/// Services shared by every request handler.
pub struct AppState {
    /// Ingestion pipeline for the configured provider.
    pub coordinator: IngestionCoordinator,
    /// History reads.
    pub queries: QueryService,
    /// The underlying store, used for health probes.
    pub store: Arc<dyn PriceStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.coordinator)
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the services around one provider and one store.
    #[must_use]
    pub fn new(provider: Arc<dyn DailyPriceProvider>, store: Arc<dyn PriceStore>) -> Self {
        Self {
            coordinator: IngestionCoordinator::new(provider, store.clone()),
            queries: QueryService::new(store.clone()),
            store,
        }
    }

    /// Name of the provider used for ingestion.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.coordinator.provider_name()
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

/// Open the store and build the configured provider.
///
/// # Errors
/// Fails if the HTTP client cannot be built, the database cannot be opened, or the
/// configured provider is unknown.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let mut registry = ProviderRegistry::new(default_http_client()?);
    for (name, settings) in [("FMP", &config.fmp), ("AlphaVantage", &config.alphavantage)] {
        if let Some(api_key) = &settings.api_key {
            registry.register(name, settings.base_url.as_str(), api_key.as_str());
        }
    }

    let provider = registry
        .create(&config.provider)
        .with_context(|| format!("configuring provider '{}'", config.provider))?;
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening database at {}", config.db_path))?;
    tracing::info!(
        provider = provider.name(),
        db_path = %config.db_path,
        "Price store ready"
    );

    Ok(Arc::new(AppState::new(provider, Arc::new(store))))
}
