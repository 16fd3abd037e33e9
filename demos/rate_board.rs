//! Rate board for a custom currency set.
//!
//! Builds a five-currency registry, applies a fixed snapshot with one
//! currency missing and prints the resulting cross rates.

use fx_propagation::core::currency::{Currency, CurrencyCode};
use fx_propagation::core::registry::CurrencyRegistry;
use fx_propagation::engine::propagation::PropagationEngine;
use fx_propagation::engine::rate_board::RateBoard;
use fx_propagation::rates::provider::StaticRateProvider;
use fx_propagation::rates::refresh::refresh;
use fx_propagation::rates::snapshot::RateSnapshot;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  fx-propagation: Rate Board Example      ║");
    println!("╚══════════════════════════════════════════╝\n");

    let registry = CurrencyRegistry::new(
        CurrencyCode::new("USD"),
        vec![
            Currency::usd(),
            Currency::eur(),
            Currency::rub(),
            Currency::new("GBP", "Pound Sterling", "£", 0.79),
            Currency::new("JPY", "Japanese Yen", "¥", 150.0),
        ],
    );
    let mut engine = match registry {
        Ok(registry) => PropagationEngine::new(registry),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    // JPY is missing and keeps its default.
    let snapshot = RateSnapshot::new([
        (CurrencyCode::new("EUR"), 0.92),
        (CurrencyCode::new("RUB"), 89.5),
        (CurrencyCode::new("GBP"), 0.78),
    ])
    .with_date("2024-06-03");

    let outcome = refresh(&mut engine, &StaticRateProvider::new(snapshot));
    println!("{}\n", outcome);

    match RateBoard::from_registry(engine.registry(), engine.rates_date()) {
        Ok(board) => print!("{}", board),
        Err(e) => eprintln!("{}", e),
    }
}
