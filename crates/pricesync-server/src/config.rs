//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, bail};

/// Output format of the log subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format '{other}', expected 'text' or 'json'"),
        }
    }
}

/// Base URL and key of one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// API root.
    pub base_url: String,
    /// API key; `None` when not configured.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Everything the server needs at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Socket address to listen on.
    pub listen_addr: SocketAddr,
    /// SQLite database file.
    pub db_path: String,
    /// Name of the provider used for ingestion.
    pub provider: String,
    /// Financial Modeling Prep settings.
    pub fmp: ProviderSettings,
    /// Alpha Vantage settings.
    pub alphavantage: ProviderSettings,
    /// Allowed CORS origins; `*` allows any.
    pub cors_allow: Vec<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    ///
    /// # Errors
    /// Returns an error for malformed values or a selected provider without an API key.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    /// As [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = var("PRICESYNC_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .with_context(|| format!("invalid PRICESYNC_LISTEN_ADDR '{listen_addr}'"))?;

        let db_path = var("PRICESYNC_DB_PATH").unwrap_or_else(|| "./pricesync.db".to_string());
        let provider = var("PRICESYNC_PROVIDER")
            .unwrap_or_else(|| "fmp".to_string())
            .trim()
            .to_string();

        let fmp = ProviderSettings {
            base_url: var("FMP_BASE_URL").unwrap_or_else(|| pricesync::FMP_BASE_URL.to_string()),
            api_key: var("FMP_API_KEY"),
        };
        let alphavantage = ProviderSettings {
            base_url: var("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| pricesync::ALPHA_VANTAGE_BASE_URL.to_string()),
            api_key: var("ALPHAVANTAGE_API_KEY"),
        };

        let cors_allow = var("PRICESYNC_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_format = var("PRICESYNC_LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()
            .context("invalid PRICESYNC_LOG_FORMAT")?
            .unwrap_or_default();

        let config = Self {
            listen_addr,
            db_path,
            provider,
            fmp,
            alphavantage,
            cors_allow,
            log_format,
        };
        config.check_provider_key()?;
        Ok(config)
    }

    fn check_provider_key(&self) -> anyhow::Result<()> {
        let (settings, variable) = match self.provider.to_ascii_lowercase().as_str() {
            "fmp" => (&self.fmp, "FMP_API_KEY"),
            "alphavantage" => (&self.alphavantage, "ALPHAVANTAGE_API_KEY"),
            other => bail!("unknown PRICESYNC_PROVIDER '{other}', expected 'fmp' or 'alphavantage'"),
        };
        if settings.api_key.is_none() {
            bail!("{variable} is required when PRICESYNC_PROVIDER={}", self.provider);
        }
        Ok(())
    }
}
