//! Live converter walkthrough.
//!
//! Loads rates (falling back to the defaults when offline), then replays
//! what a user does in the converter window: type into one field, watch the
//! others follow, clear, and type into another.

use fx_propagation::core::currency::CurrencyCode;
use fx_propagation::engine::display::DisplayBoard;
use fx_propagation::engine::propagation::PropagationEngine;
use fx_propagation::rates::provider::{HttpRateProvider, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use fx_propagation::rates::refresh::RateRefresher;

fn show(engine: &PropagationEngine, board: &DisplayBoard) {
    for currency in engine.registry().currencies() {
        println!(
            "  {} {:>16}  {}",
            currency.symbol(),
            board.text(currency.code()),
            currency.display_name()
        );
    }
    println!();
}

fn main() {
    env_logger::init();

    println!("╔══════════════════════════════════════════╗");
    println!("║  fx-propagation: Live Converter Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let mut engine = PropagationEngine::builtin();
    let mut board = DisplayBoard::with_fields(engine.registry().codes());

    // --- Step 1: Load rates in the background ---
    println!("━━━ Step 1: Loading rates ━━━\n");
    let outcome = match HttpRateProvider::new(DEFAULT_API_URL, DEFAULT_TIMEOUT) {
        Ok(provider) => RateRefresher::spawn(provider).wait(&mut engine),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    println!("{}\n", outcome);

    // --- Step 2: Type 100 into the USD field ---
    println!("━━━ Step 2: USD 100 ━━━\n");
    let usd = CurrencyCode::new("USD");
    board.type_text(&usd, "100");
    if let Err(e) = engine.on_text_changed(&usd, "100", &mut board) {
        eprintln!("{}", e);
    }
    show(&engine, &board);

    // --- Step 3: Clear everything ---
    println!("━━━ Step 3: Clear ━━━\n");
    if let Err(e) = engine.clear_all(&mut board) {
        eprintln!("{}", e);
    }
    show(&engine, &board);

    // --- Step 4: Type 5000 into the RUB field ---
    println!("━━━ Step 4: RUB 5000 ━━━\n");
    let rub = CurrencyCode::new("RUB");
    board.type_text(&rub, "5000");
    if let Err(e) = engine.on_text_changed(&rub, "5000", &mut board) {
        eprintln!("{}", e);
    }
    show(&engine, &board);
}
