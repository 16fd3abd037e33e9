//! Random user-edit streams for stress testing the propagation engine.
//!
//! A stream mixes ordinary amounts with the inputs a real amount field
//! produces while being typed into or cleared: zero spellings, empty text
//! and malformed fragments.

use crate::core::currency::{CurrencyCode, FxError};
use crate::engine::display::AmountSink;
use crate::engine::propagation::{Propagation, PropagationEngine};
use rand::Rng;
use serde::Serialize;

/// Configuration for generating an edit stream.
#[derive(Debug, Clone)]
pub struct EditStreamConfig {
    /// Number of edits to generate.
    pub edits: usize,
    /// Currencies whose fields get edited.
    pub currencies: Vec<CurrencyCode>,
    /// Minimum amount typed.
    pub min_amount: f64,
    /// Maximum amount typed.
    pub max_amount: f64,
    /// Share of edits that clear the field or type a zero, in `0.0..=1.0`.
    pub empty_ratio: f64,
    /// Share of edits that type malformed text, in `0.0..=1.0`.
    pub malformed_ratio: f64,
}

impl Default for EditStreamConfig {
    fn default() -> Self {
        Self {
            edits: 100,
            currencies: vec![
                CurrencyCode::new("USD"),
                CurrencyCode::new("EUR"),
                CurrencyCode::new("RUB"),
            ],
            min_amount: 0.01,
            max_amount: 1_000_000.0,
            empty_ratio: 0.1,
            malformed_ratio: 0.05,
        }
    }
}

/// One text change in one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edit {
    pub source: CurrencyCode,
    pub text: String,
}

const EMPTY_TEXTS: [&str; 4] = ["", "0", "0.0", "0.00"];
const MALFORMED_TEXTS: [&str; 4] = ["abc", "1.2.3", "12x", "-"];

/// Generate a random edit stream.
pub fn generate_edit_stream(config: &EditStreamConfig) -> Vec<Edit> {
    let mut rng = rand::thread_rng();
    let mut edits = Vec::with_capacity(config.edits);
    if config.currencies.is_empty() {
        return edits;
    }

    for _ in 0..config.edits {
        let source = config.currencies[rng.gen_range(0..config.currencies.len())].clone();
        let roll: f64 = rng.gen();

        let text = if roll < config.empty_ratio {
            EMPTY_TEXTS[rng.gen_range(0..EMPTY_TEXTS.len())].to_string()
        } else if roll < config.empty_ratio + config.malformed_ratio {
            MALFORMED_TEXTS[rng.gen_range(0..MALFORMED_TEXTS.len())].to_string()
        } else {
            let amount = if config.max_amount > config.min_amount {
                rng.gen_range(config.min_amount..config.max_amount)
            } else {
                config.min_amount
            };
            format!("{:.2}", amount)
        };

        edits.push(Edit { source, text });
    }

    edits
}

/// Counters collected while replaying a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub edits: usize,
    pub passes: usize,
    pub skipped: usize,
    pub fields_written: usize,
}

/// Feed every edit through the engine's text boundary.
pub fn replay<S>(
    engine: &PropagationEngine,
    edits: &[Edit],
    sink: &mut S,
) -> Result<ReplayStats, FxError>
where
    S: AmountSink + ?Sized,
{
    let mut stats = ReplayStats::default();
    for edit in edits {
        stats.edits += 1;
        match engine.on_text_changed(&edit.source, &edit.text, sink)? {
            Propagation::Completed { written, .. } => {
                stats.passes += 1;
                stats.fields_written += written;
            }
            Propagation::Skipped(_) => stats.skipped += 1,
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::display::DisplayBoard;

    #[test]
    fn test_stream_generation() {
        let config = EditStreamConfig {
            edits: 50,
            ..Default::default()
        };

        let edits = generate_edit_stream(&config);
        assert_eq!(edits.len(), 50);
        assert!(edits.iter().all(|e| config.currencies.contains(&e.source)));
    }

    #[test]
    fn test_no_currencies_yields_nothing() {
        let config = EditStreamConfig {
            currencies: vec![],
            ..Default::default()
        };
        assert!(generate_edit_stream(&config).is_empty());
    }

    #[test]
    fn test_replay_clean_stream() {
        let mut engine = PropagationEngine::builtin();
        engine.mark_rates_loaded();
        let config = EditStreamConfig {
            edits: 40,
            empty_ratio: 0.0,
            malformed_ratio: 0.0,
            min_amount: 1.0,
            ..Default::default()
        };
        let edits = generate_edit_stream(&config);

        let mut board = DisplayBoard::new();
        let stats = replay(&engine, &edits, &mut board).unwrap();
        assert_eq!(stats.passes, 40);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.fields_written, 80);
        assert_eq!(board.total_writes(), 80);
    }

    #[test]
    fn test_replay_noisy_stream_only_skips() {
        let mut engine = PropagationEngine::builtin();
        engine.mark_rates_loaded();
        let config = EditStreamConfig {
            edits: 30,
            empty_ratio: 0.5,
            malformed_ratio: 0.5,
            ..Default::default()
        };
        let edits = generate_edit_stream(&config);

        let mut board = DisplayBoard::new();
        let stats = replay(&engine, &edits, &mut board).unwrap();
        assert_eq!(stats.skipped, 30);
        assert_eq!(board.total_writes(), 0);
    }
}
