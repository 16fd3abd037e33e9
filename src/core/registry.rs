use crate::core::currency::{Currency, CurrencyCode, FxError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The set of currencies known to the engine, in display order.
///
/// All currencies are quoted against a single reference unit, which is
/// itself registered with a rate of exactly `1.0`. There is no graph
/// beyond this star: every conversion routes through the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyRegistry {
    reference: CurrencyCode,
    currencies: Vec<Currency>,
    /// Rates to restore when a refresh fails.
    defaults: HashMap<CurrencyCode, f64>,
}

impl CurrencyRegistry {
    /// Build a registry from currencies in display order.
    ///
    /// The rates given here become the fallback defaults.
    pub fn new(reference: CurrencyCode, currencies: Vec<Currency>) -> Result<Self, FxError> {
        if currencies.is_empty() {
            return Err(FxError::EmptyRegistry);
        }

        let mut defaults = HashMap::new();
        for currency in &currencies {
            if defaults
                .insert(currency.code().clone(), currency.rate_to_reference())
                .is_some()
            {
                return Err(FxError::DuplicateCurrency(currency.code().clone()));
            }
        }

        match defaults.get(&reference) {
            None => return Err(FxError::MissingReference(reference)),
            Some(&rate) if rate != 1.0 => {
                return Err(FxError::InvalidReferenceRate {
                    code: reference,
                    rate,
                })
            }
            Some(_) => {}
        }

        Ok(Self {
            reference,
            currencies,
            defaults,
        })
    }

    /// USD, EUR and RUB with USD as the reference unit.
    pub fn builtin() -> Self {
        Self {
            reference: CurrencyCode::new("USD"),
            defaults: [("USD", 1.0), ("EUR", 0.85), ("RUB", 75.0)]
                .into_iter()
                .map(|(code, rate)| (CurrencyCode::new(code), rate))
                .collect(),
            currencies: vec![Currency::usd(), Currency::eur(), Currency::rub()],
        }
    }

    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    pub fn is_reference(&self, code: &CurrencyCode) -> bool {
        &self.reference == code
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.currencies.iter().map(|c| c.code())
    }

    pub fn get(&self, code: &CurrencyCode) -> Result<&Currency, FxError> {
        self.currencies
            .iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| FxError::UnknownCurrency(code.clone()))
    }

    fn get_mut(&mut self, code: &CurrencyCode) -> Result<&mut Currency, FxError> {
        self.currencies
            .iter_mut()
            .find(|c| c.code() == code)
            .ok_or_else(|| FxError::UnknownCurrency(code.clone()))
    }

    /// The built-in rate of a currency, used when a refresh omits it.
    pub fn default_rate(&self, code: &CurrencyCode) -> Result<f64, FxError> {
        self.defaults
            .get(code)
            .copied()
            .ok_or_else(|| FxError::UnknownCurrency(code.clone()))
    }

    /// Store a new rate for one currency.
    ///
    /// The reference unit stays pinned at `1.0`; a rate for it is ignored.
    pub fn set_rate(&mut self, code: &CurrencyCode, rate_to_reference: f64) -> Result<(), FxError> {
        if self.is_reference(code) {
            warn!("ignoring rate {} for reference currency {}", rate_to_reference, code);
            return Ok(());
        }
        self.get_mut(code)?.set_rate(rate_to_reference);
        Ok(())
    }

    /// Put every currency back on its built-in rate.
    pub fn restore_defaults(&mut self) {
        for currency in &mut self.currencies {
            if let Some(&rate) = self.defaults.get(currency.code()) {
                currency.set_rate(rate);
            }
        }
    }

    /// Units of `to` bought by one unit of `from`.
    ///
    /// Zero when `from` has a zero rate.
    pub fn cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64, FxError> {
        let from = self.get(from)?;
        let to = self.get(to)?;
        Ok(to.convert_from_reference(from.convert_to_reference(1.0)))
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtin_order_and_reference() {
        let registry = CurrencyRegistry::builtin();
        let codes: Vec<&str> = registry.codes().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["USD", "EUR", "RUB"]);
        assert!(registry.is_reference(&CurrencyCode::new("USD")));
    }

    #[test]
    fn test_rejects_duplicate() {
        let result = CurrencyRegistry::new(
            CurrencyCode::new("USD"),
            vec![Currency::usd(), Currency::eur(), Currency::eur()],
        );
        assert!(matches!(result, Err(FxError::DuplicateCurrency(_))));
    }

    #[test]
    fn test_rejects_missing_reference() {
        let result = CurrencyRegistry::new(CurrencyCode::new("USD"), vec![Currency::eur()]);
        assert!(matches!(result, Err(FxError::MissingReference(_))));
    }

    #[test]
    fn test_rejects_reference_with_other_rate() {
        let result = CurrencyRegistry::new(
            CurrencyCode::new("EUR"),
            vec![Currency::usd(), Currency::eur()],
        );
        assert!(matches!(result, Err(FxError::InvalidReferenceRate { .. })));
    }

    #[test]
    fn test_rejects_empty() {
        let result = CurrencyRegistry::new(CurrencyCode::new("USD"), vec![]);
        assert!(matches!(result, Err(FxError::EmptyRegistry)));
    }

    #[test]
    fn test_set_rate_unknown() {
        let mut registry = CurrencyRegistry::builtin();
        let result = registry.set_rate(&CurrencyCode::new("GBP"), 0.79);
        assert!(matches!(result, Err(FxError::UnknownCurrency(_))));
    }

    #[test]
    fn test_set_rate_ignores_reference() {
        let mut registry = CurrencyRegistry::builtin();
        let usd = CurrencyCode::new("USD");
        assert!(registry.set_rate(&usd, 2.0).is_ok());
        assert_eq!(registry.get(&usd).unwrap().rate_to_reference(), 1.0);
        assert_relative_eq!(
            registry.cross_rate(&usd, &CurrencyCode::new("EUR")).unwrap(),
            0.85,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_restore_defaults() {
        let mut registry = CurrencyRegistry::builtin();
        let eur = CurrencyCode::new("EUR");
        registry.set_rate(&eur, 0.91).unwrap();
        registry.restore_defaults();
        assert_eq!(registry.get(&eur).unwrap().rate_to_reference(), 0.85);
    }

    #[test]
    fn test_cross_rate() {
        let registry = CurrencyRegistry::builtin();
        let eur = CurrencyCode::new("EUR");
        let rub = CurrencyCode::new("RUB");
        let usd = CurrencyCode::new("USD");
        assert_relative_eq!(registry.cross_rate(&eur, &rub).unwrap(), 75.0 / 0.85, epsilon = 1e-9);
        assert_relative_eq!(registry.cross_rate(&rub, &usd).unwrap(), 1.0 / 75.0, epsilon = 1e-12);
        assert_relative_eq!(registry.cross_rate(&usd, &eur).unwrap(), 0.85, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_rate_zero_guard() {
        let mut registry = CurrencyRegistry::builtin();
        let eur = CurrencyCode::new("EUR");
        registry.set_rate(&eur, 0.0).unwrap();
        assert_eq!(
            registry.cross_rate(&eur, &CurrencyCode::new("RUB")).unwrap(),
            0.0
        );
    }
}
