use crate::engine::display::SinkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// # Examples
///
/// ```
/// use fx_propagation::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let eur = CurrencyCode::new("EUR");
/// assert_ne!(usd, eur);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from currency and rate operations.
#[derive(Debug, Error)]
pub enum FxError {
    #[error("unknown currency {0}")]
    UnknownCurrency(CurrencyCode),
    #[error("currency {0} registered twice")]
    DuplicateCurrency(CurrencyCode),
    #[error("reference currency {0} is not registered")]
    MissingReference(CurrencyCode),
    #[error("reference currency {code} must have rate 1.0, got {rate}")]
    InvalidReferenceRate { code: CurrencyCode, rate: f64 },
    #[error("a registry needs at least one currency")]
    EmptyRegistry,
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// A currency quoted against the reference unit.
///
/// `rate_to_reference` is the number of units of this currency bought by
/// one unit of the reference currency. A rate of zero means "unknown":
/// conversions into the reference unit yield zero instead of failing.
///
/// # Examples
///
/// ```
/// use fx_propagation::core::currency::Currency;
///
/// let eur = Currency::new("EUR", "Euro", "€", 0.85);
/// assert_eq!(eur.convert_from_reference(100.0), 85.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    code: CurrencyCode,
    display_name: String,
    symbol: String,
    rate_to_reference: f64,
}

impl Currency {
    pub fn new(
        code: impl Into<CurrencyCode>,
        display_name: impl Into<String>,
        symbol: impl Into<String>,
        rate_to_reference: f64,
    ) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            symbol: symbol.into(),
            rate_to_reference,
        }
    }

    /// US dollar, the default reference unit.
    pub fn usd() -> Self {
        Self::new("USD", "US Dollar", "$", 1.0)
    }

    pub fn eur() -> Self {
        Self::new("EUR", "Euro", "€", 0.85)
    }

    pub fn rub() -> Self {
        Self::new("RUB", "Russian Ruble", "₽", 75.0)
    }

    pub fn code(&self) -> &CurrencyCode {
        &self.code
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rate_to_reference(&self) -> f64 {
        self.rate_to_reference
    }

    /// Store a new rate. Any float is accepted; callers supply non-negative values.
    pub fn set_rate(&mut self, rate_to_reference: f64) {
        self.rate_to_reference = rate_to_reference;
    }

    /// Convert an amount of this currency into the reference unit.
    ///
    /// Returns `0.0` when the rate is zero.
    pub fn convert_to_reference(&self, amount: f64) -> f64 {
        if self.rate_to_reference == 0.0 {
            return 0.0;
        }
        amount / self.rate_to_reference
    }

    /// Convert an amount of the reference unit into this currency.
    pub fn convert_from_reference(&self, amount: f64) -> f64 {
        amount * self.rate_to_reference
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.code, self.symbol, self.display_name)
    }
}
