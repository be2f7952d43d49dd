//! Provider registry: per-provider configuration and adapter construction by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use pricesync_core::{DailyPriceProvider, ProviderConfig, Result, SyncError};

/// Holds the configuration of every known provider and builds adapters on demand.
///
/// Names are matched case-insensitively. The registry is only mutated while it is
/// being set up; afterwards it is shared read-only.
///
/// # Example
///
/// ```rust,ignore
/// use pricesync::ProviderRegistry;
///
/// let registry = ProviderRegistry::new(reqwest::Client::new())
///     .with_provider("AlphaVantage", "https://www.alphavantage.co/query", "demo")
///     .with_provider("FMP", "https://financialmodelingprep.com", "key");
///
/// let provider = registry.create("alphavantage")?;
/// ```
#[derive(Clone)]
pub struct ProviderRegistry {
    client: Client,
    providers: BTreeMap<String, (String, ProviderConfig)>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.values().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry whose adapters share `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            providers: BTreeMap::new(),
        }
    }

    /// Register (or replace) the configuration for `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) {
        let name = name.into();
        debug!(provider = %name, "Registering provider");
        self.providers.insert(
            name.to_ascii_lowercase(),
            (name, ProviderConfig::new(base_url, api_key)),
        );
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.register(name, base_url, api_key);
        self
    }

    /// Names of the registered providers, sorted case-insensitively.
    #[must_use]
    pub fn registered_providers(&self) -> Vec<String> {
        self.providers
            .values()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Build the adapter registered under `name`.
    ///
    /// # Errors
    /// [`SyncError::ProviderNotConfigured`] if nothing is registered under `name`;
    /// [`SyncError::NotSupported`] if it is registered but no adapter for it is
    /// compiled into this build.
    pub fn create(&self, name: &str) -> Result<Arc<dyn DailyPriceProvider>> {
        let key = name.trim().to_ascii_lowercase();
        let (_, config) = self
            .providers
            .get(&key)
            .ok_or_else(|| SyncError::ProviderNotConfigured(name.to_string()))?;

        self.build(&key, config.clone())
            .ok_or_else(|| SyncError::NotSupported(format!("provider {name}")))
    }

    #[cfg_attr(
        not(any(feature = "alphavantage", feature = "fmp")),
        allow(unused_variables)
    )]
    fn build(&self, key: &str, config: ProviderConfig) -> Option<Arc<dyn DailyPriceProvider>> {
        match key {
            #[cfg(feature = "alphavantage")]
            "alphavantage" => Some(Arc::new(
                pricesync_alphavantage::AlphaVantageProvider::with_config(
                    self.client.clone(),
                    config,
                ),
            )),
            #[cfg(feature = "fmp")]
            "fmp" => Some(Arc::new(pricesync_fmp::FmpProvider::with_config(
                self.client.clone(),
                config,
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricesync_core::{DataProvider, ErrorKind};

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(Client::new())
            .with_provider("FMP", "https://financialmodelingprep.com", "fmp_key")
            .with_provider("AlphaVantage", "https://www.alphavantage.co/query", "av_key")
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = registry();

        #[cfg(feature = "fmp")]
        {
            assert_eq!(registry.create("fmp").unwrap().name(), "FMP");
            assert_eq!(registry.create("Fmp").unwrap().name(), "FMP");
        }
        #[cfg(feature = "alphavantage")]
        assert_eq!(
            registry.create("ALPHAVANTAGE").unwrap().name(),
            "AlphaVantage"
        );
    }

    #[test]
    fn test_unknown_provider() {
        let err = registry().create("yahoo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, SyncError::ProviderNotConfigured(ref name) if name == "yahoo"));
    }

    #[test]
    fn test_registered_without_adapter_is_not_supported() {
        let registry = registry().with_provider("Polygon", "https://api.polygon.io", "key");
        let err = registry.create("polygon").unwrap_err();
        assert!(matches!(err, SyncError::NotSupported(_)));
    }

    #[test]
    fn test_registered_providers_sorted() {
        assert_eq!(registry().registered_providers(), vec!["AlphaVantage", "FMP"]);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let output = format!("{:?}", registry());
        assert!(!output.contains("fmp_key"));
        assert!(!output.contains("av_key"));
    }
}
