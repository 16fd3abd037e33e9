use crate::core::currency::CurrencyCode;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A display field rejected a write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("field {code} rejected the write: {reason}")]
    Rejected { code: CurrencyCode, reason: String },
}

/// Destination of propagated amounts: one text field per currency.
///
/// A front-end implements this over its input widgets. The engine writes
/// already-formatted text and never reads the fields back.
pub trait AmountSink {
    fn write_amount(&mut self, code: &CurrencyCode, text: &str) -> Result<(), SinkError>;

    fn clear(&mut self, code: &CurrencyCode) -> Result<(), SinkError>;
}

/// State of a single display field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    pub text: String,
    /// Number of engine writes received, clears excluded.
    pub writes: usize,
}

/// In-memory set of display fields.
///
/// Used by the terminal front-end and by tests to observe exactly what a
/// propagation pass wrote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayBoard {
    fields: BTreeMap<CurrencyCode, Field>,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A board with one empty field per code.
    pub fn with_fields<'a>(codes: impl IntoIterator<Item = &'a CurrencyCode>) -> Self {
        Self {
            fields: codes
                .into_iter()
                .map(|code| (code.clone(), Field::default()))
                .collect(),
        }
    }

    /// Text typed by the user, as a UI field would hold it before notifying.
    pub fn type_text(&mut self, code: &CurrencyCode, text: &str) {
        self.fields.entry(code.clone()).or_default().text = text.to_string();
    }

    pub fn text(&self, code: &CurrencyCode) -> &str {
        self.fields.get(code).map(|f| f.text.as_str()).unwrap_or("")
    }

    pub fn writes(&self, code: &CurrencyCode) -> usize {
        self.fields.get(code).map(|f| f.writes).unwrap_or(0)
    }

    pub fn total_writes(&self) -> usize {
        self.fields.values().map(|f| f.writes).sum()
    }

    pub fn fields(&self) -> &BTreeMap<CurrencyCode, Field> {
        &self.fields
    }
}

impl AmountSink for DisplayBoard {
    fn write_amount(&mut self, code: &CurrencyCode, text: &str) -> Result<(), SinkError> {
        let field = self.fields.entry(code.clone()).or_default();
        field.text = text.to_string();
        field.writes += 1;
        Ok(())
    }

    fn clear(&mut self, code: &CurrencyCode) -> Result<(), SinkError> {
        self.fields.entry(code.clone()).or_default().text.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_counts() {
        let eur = CurrencyCode::new("EUR");
        let mut board = DisplayBoard::new();
        board.write_amount(&eur, "85.0000").unwrap();
        board.write_amount(&eur, "86.0000").unwrap();
        assert_eq!(board.text(&eur), "86.0000");
        assert_eq!(board.writes(&eur), 2);
    }

    #[test]
    fn test_clear_keeps_count() {
        let eur = CurrencyCode::new("EUR");
        let mut board = DisplayBoard::new();
        board.write_amount(&eur, "85.0000").unwrap();
        board.clear(&eur).unwrap();
        assert_eq!(board.text(&eur), "");
        assert_eq!(board.writes(&eur), 1);
    }

    #[test]
    fn test_typed_text_is_not_a_write() {
        let usd = CurrencyCode::new("USD");
        let mut board = DisplayBoard::with_fields([&usd]);
        board.type_text(&usd, "100");
        assert_eq!(board.text(&usd), "100");
        assert_eq!(board.total_writes(), 0);
    }

    #[test]
    fn test_unknown_field_is_empty() {
        let board = DisplayBoard::new();
        assert_eq!(board.text(&CurrencyCode::new("GBP")), "");
    }
}
