use crate::core::currency::CurrencyCode;
use crate::engine::propagation::PropagationEngine;
use crate::rates::provider::{FetchError, RateProvider};
use crate::rates::snapshot::RateSnapshot;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// Result of applying a refresh to an engine.
///
/// Either way the engine is left with `rates_loaded` set and accepts edits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RefreshOutcome {
    /// Live rates were applied.
    Live {
        date: Option<NaiveDate>,
        /// Currencies absent from the snapshot, kept on their built-in default.
        missing: Vec<CurrencyCode>,
    },
    /// The fetch failed; prior rates stay in place.
    Fallback { reason: String },
}

impl RefreshOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, RefreshOutcome::Live { .. })
    }
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshOutcome::Live { date, missing } => {
                match date {
                    Some(date) => write!(f, "Rates loaded (published {})", date)?,
                    None => write!(f, "Rates loaded")?,
                }
                if !missing.is_empty() {
                    let codes: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
                    write!(f, "; defaults used for {}", codes.join(", "))?;
                }
                Ok(())
            }
            RefreshOutcome::Fallback { reason } => write!(
                f,
                "Could not load current rates: {}. Using default rates.",
                reason
            ),
        }
    }
}

/// Apply a fetched rate set to every non-reference currency.
///
/// Rates quoted against another base are first re-quoted against the
/// engine's reference; a snapshot that cannot be re-quoted is handled like a
/// failed fetch. A currency the snapshot does not quote gets its built-in
/// default rate.
pub fn apply_snapshot(engine: &mut PropagationEngine, snapshot: &RateSnapshot) -> RefreshOutcome {
    let snapshot = match snapshot.rebased(engine.registry().reference()) {
        Ok(snapshot) => snapshot,
        Err(e) => return apply_fallback(engine, &e),
    };
    let registry = engine.registry();
    let mut updates = Vec::new();
    let mut missing = Vec::new();
    for code in registry.codes().filter(|c| !registry.is_reference(c)) {
        let rate = match snapshot.rate(code) {
            Some(rate) => rate,
            None => {
                missing.push(code.clone());
                // Codes come from the registry, so the default always exists.
                registry.default_rate(code).unwrap_or(0.0)
            }
        };
        if rate <= 0.0 {
            warn!("non-positive rate {} for {}; conversions from it yield 0", rate, code);
        }
        updates.push((code.clone(), rate));
    }

    for (code, rate) in &updates {
        if let Err(e) = engine.set_rate(code, *rate) {
            warn!("skipping rate for {}: {}", code, e);
        }
    }

    let date = snapshot.published();
    engine.set_rates_date(date);
    engine.mark_rates_loaded();

    if !missing.is_empty() {
        warn!("rate source omitted {:?}; using defaults", missing);
    }
    info!(
        "applied {} rates{}",
        updates.len(),
        date.map(|d| format!(" published {}", d)).unwrap_or_default()
    );

    RefreshOutcome::Live { date, missing }
}

/// Keep the prior rates and enable the engine after a failed fetch.
pub fn apply_fallback(engine: &mut PropagationEngine, error: &FetchError) -> RefreshOutcome {
    warn!("rate refresh failed: {}; keeping current rates", error);
    engine.mark_rates_loaded();
    RefreshOutcome::Fallback {
        reason: error.to_string(),
    }
}

/// Fetch and apply a rate set on the calling thread.
pub fn refresh<P>(engine: &mut PropagationEngine, provider: &P) -> RefreshOutcome
where
    P: RateProvider + ?Sized,
{
    apply_result(engine, provider.fetch())
}

fn apply_result(
    engine: &mut PropagationEngine,
    result: Result<RateSnapshot, FetchError>,
) -> RefreshOutcome {
    match result {
        Ok(snapshot) => apply_snapshot(engine, &snapshot),
        Err(e) => apply_fallback(engine, &e),
    }
}

/// A rate fetch running on a background thread.
///
/// The worker only fetches; the result is applied by whichever thread owns
/// the engine, through [`poll`](Self::poll) or [`wait`](Self::wait). Rate
/// changes therefore always land between propagation passes.
#[derive(Debug)]
pub struct RateRefresher {
    receiver: Receiver<Result<RateSnapshot, FetchError>>,
    handle: Option<JoinHandle<()>>,
}

impl RateRefresher {
    pub fn spawn<P>(provider: P) -> Self
    where
        P: RateProvider + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            // The receiver may be gone if the refresher was dropped.
            let _ = sender.send(provider.fetch());
        });

        Self {
            receiver,
            handle: Some(handle),
        }
    }

    /// Apply the result if the fetch has finished.
    ///
    /// Returns `None` while the fetch is still running and after the result
    /// has been consumed.
    pub fn poll(&mut self, engine: &mut PropagationEngine) -> Option<RefreshOutcome> {
        self.handle.as_ref()?;
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(FetchError::Disconnected),
        };
        self.join();
        Some(apply_result(engine, result))
    }

    /// Block until the fetch finishes and apply its result.
    pub fn wait(mut self, engine: &mut PropagationEngine) -> RefreshOutcome {
        let result = self
            .receiver
            .recv()
            .unwrap_or(Err(FetchError::Disconnected));
        self.join();
        apply_result(engine, result)
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("rate fetch worker panicked");
            }
        }
    }
}
