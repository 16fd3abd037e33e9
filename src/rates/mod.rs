//! Fetching exchange rates and applying them to the engine.

pub mod provider;
pub mod refresh;
pub mod snapshot;
