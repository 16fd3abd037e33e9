//! # fx-propagation
//!
//! Live multi-currency converter engine.
//!
//! A set of currencies is quoted against one reference unit (USD by
//! default). When the amount of one currency is edited, the engine converts
//! it into the reference unit and from there into every other currency,
//! writing the results back to the display fields without ever reacting to
//! its own writes.
//!
//! ## Architecture
//!
//! - **core** — Currency records and the registry keyed by currency code
//! - **engine** — The propagation pass, its re-entrancy latch and the field boundary
//! - **rates** — Exchange-rate snapshots, HTTP fetching and background refresh
//! - **config** — Converter configuration loaded from JSON
//! - **simulation** — Random edit streams for stress testing

pub mod config;
pub mod core;
pub mod engine;
pub mod rates;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::ConverterConfig;
    pub use crate::core::currency::{Currency, CurrencyCode, FxError};
    pub use crate::core::registry::CurrencyRegistry;
    pub use crate::engine::display::{AmountSink, DisplayBoard};
    pub use crate::engine::propagation::{Propagation, PropagationEngine, SkipReason};
    pub use crate::engine::rate_board::RateBoard;
    pub use crate::rates::provider::{HttpRateProvider, RateProvider, StaticRateProvider};
    pub use crate::rates::refresh::{refresh, RateRefresher, RefreshOutcome};
    pub use crate::rates::snapshot::RateSnapshot;
}
