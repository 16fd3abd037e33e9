use crate::core::currency::{CurrencyCode, FxError};
use crate::core::registry::CurrencyRegistry;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Price of one unit of a currency in another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub currency: CurrencyCode,
    pub rate: f64,
}

/// Cross rates of one currency against every other registered currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLine {
    pub currency: CurrencyCode,
    pub quotes: Vec<Quote>,
}

impl fmt::Display for RateLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 {} =", self.currency)?;
        for (i, quote) in self.quotes.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            write!(f, " {:.4} {}", quote.rate, quote.currency)?;
        }
        Ok(())
    }
}

/// Summary of the current rate set, one line per currency.
///
/// Cross rates go through the reference unit; a currency with a zero rate
/// quotes zero against everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateBoard {
    pub reference: CurrencyCode,
    pub date: Option<NaiveDate>,
    pub lines: Vec<RateLine>,
}

impl RateBoard {
    pub fn from_registry(registry: &CurrencyRegistry, date: Option<NaiveDate>) -> Result<Self, FxError> {
        let mut lines = Vec::with_capacity(registry.len());
        for from in registry.codes() {
            let mut quotes = Vec::with_capacity(registry.len().saturating_sub(1));
            for to in registry.codes().filter(|to| *to != from) {
                quotes.push(Quote {
                    currency: to.clone(),
                    rate: registry.cross_rate(from, to)?,
                });
            }
            lines.push(RateLine {
                currency: from.clone(),
                quotes,
            });
        }

        Ok(Self {
            reference: registry.reference().clone(),
            date,
            lines,
        })
    }

    pub fn line(&self, code: &CurrencyCode) -> Option<&RateLine> {
        self.lines.iter().find(|l| &l.currency == code)
    }
}

impl fmt::Display for RateBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "═══ Exchange rates (reference {}) ═══", self.reference)?;
        match self.date {
            Some(date) => writeln!(f, "Last update: {}", date)?,
            None => writeln!(f, "Last update: built-in defaults")?,
        }
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}
