use crate::core::currency::CurrencyCode;
use crate::rates::provider::FetchError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One response of the exchange-rate API.
///
/// Mirrors the public `latest/<BASE>` JSON shape; fields other than
/// `base`, `date` and `rates` are ignored.
///
/// ```json
/// { "base": "USD", "date": "2024-01-15", "rates": { "EUR": 0.85, "RUB": 75.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    #[serde(default)]
    pub base: Option<CurrencyCode>,
    #[serde(default)]
    pub date: Option<String>,
    pub rates: HashMap<CurrencyCode, f64>,
}

impl RateSnapshot {
    pub fn new(rates: impl IntoIterator<Item = (CurrencyCode, f64)>) -> Self {
        Self {
            base: None,
            date: None,
            rates: rates.into_iter().collect(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(CurrencyCode::new(base));
        self
    }

    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Re-quote every rate against `reference`.
    ///
    /// A snapshot without a `base`, or already based on `reference`, is
    /// returned unchanged. Otherwise every rate is divided by the snapshot's
    /// rate for `reference`, which must be present and positive.
    pub fn rebased(&self, reference: &CurrencyCode) -> Result<Self, FetchError> {
        let base = match &self.base {
            Some(base) if base != reference => base,
            _ => return Ok(self.clone()),
        };
        let pivot = match self.rate(reference) {
            Some(rate) if rate > 0.0 && rate.is_finite() => rate,
            Some(rate) => {
                return Err(FetchError::Decode(format!(
                    "rates quoted against {} give {} a rate of {}",
                    base, reference, rate
                )))
            }
            None => {
                return Err(FetchError::Decode(format!(
                    "rates quoted against {} do not include {}",
                    base, reference
                )))
            }
        };

        let mut rates: HashMap<CurrencyCode, f64> = self
            .rates
            .iter()
            .map(|(code, rate)| (code.clone(), rate / pivot))
            .collect();
        rates.entry(base.clone()).or_insert(1.0 / pivot);
        rates.insert(reference.clone(), 1.0);

        Ok(Self {
            base: Some(reference.clone()),
            date: self.date.clone(),
            rates,
        })
    }

    /// Publication date, when present and in `YYYY-MM-DD` form.
    pub fn published(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}
