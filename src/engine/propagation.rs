use crate::core::currency::{CurrencyCode, FxError};
use crate::core::registry::CurrencyRegistry;
use crate::engine::context::ConversionContext;
use crate::engine::display::AmountSink;
use crate::engine::input::{format_amount, parse_amount};
use chrono::NaiveDate;
use log::{debug, trace};
use serde::Serialize;
use std::fmt;

/// Why an edit did not start a propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// A pass is already running; the edit came from the engine's own writes.
    Reentrant,
    /// No rate set has been applied yet.
    RatesNotLoaded,
    /// Empty, zero or malformed input.
    EmptyInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Reentrant => write!(f, "propagation already in progress"),
            SkipReason::RatesNotLoaded => write!(f, "rates not loaded"),
            SkipReason::EmptyInput => write!(f, "no input"),
        }
    }
}

/// Outcome of one edit notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Propagation {
    Skipped(SkipReason),
    Completed {
        source: CurrencyCode,
        /// The edited amount expressed in the reference unit.
        reference_amount: f64,
        /// Number of fields written.
        written: usize,
    },
}

impl Propagation {
    pub fn is_completed(&self) -> bool {
        matches!(self, Propagation::Completed { .. })
    }

    pub fn written(&self) -> usize {
        match self {
            Propagation::Completed { written, .. } => *written,
            Propagation::Skipped(_) => 0,
        }
    }
}

/// Keeps a set of currency amounts consistent through the reference unit.
///
/// An edit of one amount is converted into the reference currency and from
/// there into every other registered currency, which are written back to
/// an [`AmountSink`]. Passes are not reentrant: writes that trigger further
/// edit notifications while a pass runs are ignored.
///
/// Rate changes require `&mut self` and therefore can never land in the
/// middle of a pass; every pass sees one consistent rate set.
///
/// # Examples
///
/// ```
/// use fx_propagation::core::currency::CurrencyCode;
/// use fx_propagation::engine::display::DisplayBoard;
/// use fx_propagation::engine::propagation::PropagationEngine;
///
/// let mut engine = PropagationEngine::builtin();
/// engine.mark_rates_loaded();
///
/// let mut board = DisplayBoard::new();
/// engine
///     .on_amount_changed(&CurrencyCode::new("USD"), 100.0, &mut board)
///     .unwrap();
/// assert_eq!(board.text(&CurrencyCode::new("EUR")), "85.0000");
/// assert_eq!(board.text(&CurrencyCode::new("RUB")), "7500.0000");
/// ```
#[derive(Debug)]
pub struct PropagationEngine {
    registry: CurrencyRegistry,
    context: ConversionContext,
    rates_date: Option<NaiveDate>,
}

impl PropagationEngine {
    pub fn new(registry: CurrencyRegistry) -> Self {
        Self {
            registry,
            context: ConversionContext::new(),
            rates_date: None,
        }
    }

    /// Engine over USD, EUR and RUB with the built-in default rates.
    pub fn builtin() -> Self {
        Self::new(CurrencyRegistry::builtin())
    }

    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ConversionContext {
        &self.context
    }

    pub fn is_updating(&self) -> bool {
        self.context.is_updating()
    }

    pub fn rates_loaded(&self) -> bool {
        self.context.rates_loaded()
    }

    /// Enable propagation with whatever rates are currently stored.
    pub fn mark_rates_loaded(&mut self) {
        self.context.set_rates_loaded(true);
    }

    /// Publication date of the applied rate set, when the source gave one.
    pub fn rates_date(&self) -> Option<NaiveDate> {
        self.rates_date
    }

    pub fn set_rates_date(&mut self, date: Option<NaiveDate>) {
        self.rates_date = date;
    }

    /// Store a new rate for one currency. The value is not validated; a rate
    /// for the reference unit is ignored.
    pub fn set_rate(&mut self, code: &CurrencyCode, rate_to_reference: f64) -> Result<(), FxError> {
        self.registry.set_rate(code, rate_to_reference)
    }

    /// Put every currency back on its built-in rate.
    pub fn restore_default_rates(&mut self) {
        self.registry.restore_defaults();
    }

    /// Convert an amount of `code` into the reference unit; zero on a zero rate.
    pub fn convert_to_reference(&self, code: &CurrencyCode, amount: f64) -> Result<f64, FxError> {
        Ok(self.registry.get(code)?.convert_to_reference(amount))
    }

    /// Convert an amount of the reference unit into `code`.
    pub fn convert_from_reference(&self, code: &CurrencyCode, amount: f64) -> Result<f64, FxError> {
        Ok(self.registry.get(code)?.convert_from_reference(amount))
    }

    /// Handle an edit of `source`'s amount: recompute and write every other field.
    ///
    /// A no-op while a pass is running, before rates are loaded, and for a
    /// zero or non-finite amount. The latch is released on every exit path, including a
    /// sink error.
    pub fn on_amount_changed<S>(
        &self,
        source: &CurrencyCode,
        amount: f64,
        sink: &mut S,
    ) -> Result<Propagation, FxError>
    where
        S: AmountSink + ?Sized,
    {
        if !self.context.rates_loaded() {
            debug!("edit of {} ignored: {}", source, SkipReason::RatesNotLoaded);
            return Ok(Propagation::Skipped(SkipReason::RatesNotLoaded));
        }
        if amount == 0.0 || !amount.is_finite() {
            return Ok(Propagation::Skipped(SkipReason::EmptyInput));
        }
        let _guard = match self.context.try_begin() {
            Some(guard) => guard,
            None => {
                trace!("edit of {} ignored: {}", source, SkipReason::Reentrant);
                return Ok(Propagation::Skipped(SkipReason::Reentrant));
            }
        };

        let reference_amount = self.registry.get(source)?.convert_to_reference(amount);

        let mut written = 0;
        for currency in self.registry.currencies() {
            if currency.code() == source {
                continue;
            }
            let value = currency.convert_from_reference(reference_amount);
            if let Some(text) = format_amount(value) {
                sink.write_amount(currency.code(), &text)?;
                written += 1;
            }
        }

        debug!(
            "propagated {} {} ({} {}) to {} fields",
            amount,
            source,
            reference_amount,
            self.registry.reference(),
            written
        );

        Ok(Propagation::Completed {
            source: source.clone(),
            reference_amount,
            written,
        })
    }

    /// Handle a text-change notification from `source`'s display field.
    ///
    /// Text that does not parse to a positive amount is ignored here and
    /// never reaches the engine.
    pub fn on_text_changed<S>(
        &self,
        source: &CurrencyCode,
        text: &str,
        sink: &mut S,
    ) -> Result<Propagation, FxError>
    where
        S: AmountSink + ?Sized,
    {
        match parse_amount(text) {
            Some(amount) => self.on_amount_changed(source, amount, sink),
            None => Ok(Propagation::Skipped(SkipReason::EmptyInput)),
        }
    }

    /// Clear every field while holding the latch.
    ///
    /// The change notifications fired by the clears do not start passes.
    pub fn clear_all<S>(&self, sink: &mut S) -> Result<(), FxError>
    where
        S: AmountSink + ?Sized,
    {
        // Inside a running pass the latch is already held.
        let _guard = self.context.try_begin();
        for code in self.registry.codes() {
            sink.clear(code)?;
        }
        Ok(())
    }
}

impl Default for PropagationEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::display::{DisplayBoard, SinkError};
    use approx::assert_relative_eq;

    fn loaded_engine() -> PropagationEngine {
        let mut engine = PropagationEngine::builtin();
        engine.mark_rates_loaded();
        engine
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s)
    }

    /// Fails on the first write to `fail_on`.
    struct FailingSink {
        fail_on: CurrencyCode,
        board: DisplayBoard,
    }

    impl AmountSink for FailingSink {
        fn write_amount(&mut self, code: &CurrencyCode, text: &str) -> Result<(), SinkError> {
            if code == &self.fail_on {
                return Err(SinkError::Rejected {
                    code: code.clone(),
                    reason: "read-only".to_string(),
                });
            }
            self.board.write_amount(code, text)
        }

        fn clear(&mut self, code: &CurrencyCode) -> Result<(), SinkError> {
            self.board.clear(code)
        }
    }

    /// Feeds every write back into the engine, as a UI change signal would.
    struct EchoSink<'a> {
        engine: &'a PropagationEngine,
        board: DisplayBoard,
        echoes: Vec<Propagation>,
    }

    impl AmountSink for EchoSink<'_> {
        fn write_amount(&mut self, code: &CurrencyCode, text: &str) -> Result<(), SinkError> {
            self.board.write_amount(code, text)?;
            let mut scratch = DisplayBoard::new();
            let echo = self
                .engine
                .on_text_changed(code, text, &mut scratch)
                .map_err(|e| SinkError::Rejected {
                    code: code.clone(),
                    reason: e.to_string(),
                })?;
            assert_eq!(scratch.total_writes(), 0);
            self.echoes.push(echo);
            Ok(())
        }

        fn clear(&mut self, code: &CurrencyCode) -> Result<(), SinkError> {
            self.board.clear(code)
        }
    }

    #[test]
    fn test_usd_edit_scenario() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("USD"), 100.0, &mut board).unwrap();

        assert_eq!(outcome.written(), 2);
        assert_eq!(board.text(&code("EUR")), "85.0000");
        assert_eq!(board.text(&code("RUB")), "7500.0000");
        assert_eq!(board.writes(&code("USD")), 0);
        assert!(!engine.is_updating());
    }

    #[test]
    fn test_eur_edit_goes_through_reference() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("EUR"), 85.0, &mut board).unwrap();

        match outcome {
            Propagation::Completed { reference_amount, .. } => {
                assert_relative_eq!(reference_amount, 100.0, epsilon = 1e-9)
            }
            other => panic!("expected a pass, got {:?}", other),
        }
        assert_eq!(board.text(&code("USD")), "100.0000");
        assert_eq!(board.text(&code("RUB")), "7500.0000");
    }

    #[test]
    fn test_zero_edit_writes_nothing() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("EUR"), 0.0, &mut board).unwrap();
        assert_eq!(outcome, Propagation::Skipped(SkipReason::EmptyInput));
        assert_eq!(board.total_writes(), 0);
    }

    #[test]
    fn test_not_loaded_is_noop() {
        let engine = PropagationEngine::builtin();
        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("USD"), 100.0, &mut board).unwrap();
        assert_eq!(outcome, Propagation::Skipped(SkipReason::RatesNotLoaded));
        assert_eq!(board.total_writes(), 0);
    }

    #[test]
    fn test_held_latch_is_strict_noop() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();
        let guard = engine.context().try_begin().unwrap();

        let outcome = engine.on_amount_changed(&code("USD"), 100.0, &mut board).unwrap();
        assert_eq!(outcome, Propagation::Skipped(SkipReason::Reentrant));
        assert_eq!(board.total_writes(), 0);
        assert!(engine.is_updating());

        drop(guard);
        assert!(!engine.is_updating());
    }

    #[test]
    fn test_echoed_writes_are_ignored() {
        let engine = loaded_engine();
        let mut sink = EchoSink {
            engine: &engine,
            board: DisplayBoard::new(),
            echoes: Vec::new(),
        };

        let outcome = engine.on_amount_changed(&code("RUB"), 7500.0, &mut sink).unwrap();
        assert_eq!(outcome.written(), 2);
        assert_eq!(
            sink.echoes,
            vec![
                Propagation::Skipped(SkipReason::Reentrant),
                Propagation::Skipped(SkipReason::Reentrant)
            ]
        );
        assert_eq!(sink.board.writes(&code("USD")), 1);
        assert_eq!(sink.board.writes(&code("EUR")), 1);
    }

    #[test]
    fn test_latch_released_after_sink_error() {
        let engine = loaded_engine();
        let mut sink = FailingSink {
            fail_on: code("EUR"),
            board: DisplayBoard::new(),
        };

        let result = engine.on_amount_changed(&code("USD"), 100.0, &mut sink);
        assert!(matches!(result, Err(FxError::Sink(_))));
        assert!(!engine.is_updating());

        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("USD"), 1.0, &mut board).unwrap();
        assert!(outcome.is_completed());
    }

    #[test]
    fn test_unknown_source_releases_latch() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();
        let result = engine.on_amount_changed(&code("GBP"), 10.0, &mut board);
        assert!(matches!(result, Err(FxError::UnknownCurrency(_))));
        assert!(!engine.is_updating());
    }

    #[test]
    fn test_zero_rate_target_left_as_is() {
        let mut engine = loaded_engine();
        engine.set_rate(&code("RUB"), 0.0).unwrap();
        let mut board = DisplayBoard::new();
        board.type_text(&code("RUB"), "123.0000");

        let outcome = engine.on_amount_changed(&code("USD"), 10.0, &mut board).unwrap();
        assert_eq!(outcome.written(), 1);
        assert_eq!(board.text(&code("RUB")), "123.0000");
    }

    #[test]
    fn test_zero_rate_source_writes_nothing() {
        let mut engine = loaded_engine();
        engine.set_rate(&code("EUR"), 0.0).unwrap();
        assert_eq!(engine.convert_to_reference(&code("EUR"), 50.0).unwrap(), 0.0);

        let mut board = DisplayBoard::new();
        let outcome = engine.on_amount_changed(&code("EUR"), 50.0, &mut board).unwrap();
        assert_eq!(outcome.written(), 0);
    }

    #[test]
    fn test_text_boundary() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();

        for text in ["abc", "0", "0.0", "0.00", ""] {
            let outcome = engine.on_text_changed(&code("USD"), text, &mut board).unwrap();
            assert_eq!(outcome, Propagation::Skipped(SkipReason::EmptyInput));
        }
        assert_eq!(board.total_writes(), 0);

        engine.on_text_changed(&code("USD"), "2", &mut board).unwrap();
        assert_eq!(board.text(&code("EUR")), "1.7000");
    }

    #[test]
    fn test_clear_all_does_not_propagate() {
        let engine = loaded_engine();
        let mut sink = EchoSink {
            engine: &engine,
            board: DisplayBoard::new(),
            echoes: Vec::new(),
        };
        engine.on_amount_changed(&code("USD"), 100.0, &mut sink).unwrap();
        engine.clear_all(&mut sink).unwrap();

        assert_eq!(sink.board.text(&code("EUR")), "");
        assert_eq!(sink.board.text(&code("RUB")), "");
        assert!(!engine.is_updating());
    }

    #[test]
    fn test_set_rate_changes_next_pass() {
        let mut engine = loaded_engine();
        engine.set_rate(&code("EUR"), 0.9).unwrap();
        let mut board = DisplayBoard::new();
        engine.on_amount_changed(&code("USD"), 100.0, &mut board).unwrap();
        assert_eq!(board.text(&code("EUR")), "90.0000");
    }

    #[test]
    fn test_reference_rate_is_pinned() {
        let mut engine = loaded_engine();
        engine.set_rate(&code("USD"), 2.0).unwrap();
        assert_eq!(engine.convert_to_reference(&code("USD"), 100.0).unwrap(), 100.0);

        let mut board = DisplayBoard::new();
        engine.on_amount_changed(&code("USD"), 100.0, &mut board).unwrap();
        assert_eq!(board.text(&code("EUR")), "85.0000");
        assert_eq!(board.text(&code("RUB")), "7500.0000");
    }

    #[test]
    fn test_non_finite_amount_writes_nothing() {
        let engine = loaded_engine();
        let mut board = DisplayBoard::new();

        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let outcome = engine.on_amount_changed(&code("EUR"), amount, &mut board).unwrap();
            assert_eq!(outcome, Propagation::Skipped(SkipReason::EmptyInput));
        }
        assert_eq!(board.total_writes(), 0);
        assert!(!engine.is_updating());
    }
}
