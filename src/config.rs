//! Converter configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "api_url": "https://api.exchangerate-api.com/v4/latest/USD",
//!   "timeout_secs": 10,
//!   "reference": "USD",
//!   "currencies": [
//!     { "code": "USD", "display_name": "US Dollar", "symbol": "$", "default_rate": 1.0 },
//!     { "code": "GBP", "display_name": "Pound Sterling", "symbol": "£", "default_rate": 0.79 }
//!   ]
//! }
//! ```

use crate::core::currency::{Currency, CurrencyCode, FxError};
use crate::core::registry::CurrencyRegistry;
use crate::rates::provider::{FetchError, HttpRateProvider, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Currency(#[from] FxError),
}

/// One currency shown by the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: CurrencyCode,
    pub display_name: String,
    pub symbol: String,
    /// Rate used until, and whenever, live rates are unavailable.
    pub default_rate: f64,
}

impl From<&Currency> for CurrencyConfig {
    fn from(currency: &Currency) -> Self {
        Self {
            code: currency.code().clone(),
            display_name: currency.display_name().to_string(),
            symbol: currency.symbol().to_string(),
            default_rate: currency.rate_to_reference(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub reference: CurrencyCode,
    /// Currencies in display order.
    pub currencies: Vec<CurrencyConfig>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            reference: CurrencyCode::new("USD"),
            currencies: CurrencyRegistry::builtin()
                .currencies()
                .iter()
                .map(CurrencyConfig::from)
                .collect(),
        }
    }
}

impl ConverterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.registry()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn registry(&self) -> Result<CurrencyRegistry, FxError> {
        let currencies = self
            .currencies
            .iter()
            .map(|c| {
                Currency::new(
                    c.code.clone(),
                    c.display_name.clone(),
                    c.symbol.clone(),
                    c.default_rate,
                )
            })
            .collect();
        CurrencyRegistry::new(self.reference.clone(), currencies)
    }

    pub fn http_provider(&self) -> Result<HttpRateProvider, FetchError> {
        HttpRateProvider::new(self.api_url.clone(), self.timeout())
    }
}
