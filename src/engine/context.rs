use std::cell::Cell;

/// Per-engine propagation state.
///
/// `updating` is a non-reentrant latch: it is held for the duration of one
/// propagation pass and released by [`PropagationGuard`] on every exit path,
/// including an unwinding panic. It lives in a `Cell` so that a pass can
/// run through `&self` and a write-back that re-enters the engine observes
/// the latch instead of deadlocking or recursing.
///
/// `rates_loaded` only changes through `&mut` access, i.e. never during a
/// pass.
#[derive(Debug, Default)]
pub struct ConversionContext {
    updating: Cell<bool>,
    rates_loaded: bool,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }

    pub fn rates_loaded(&self) -> bool {
        self.rates_loaded
    }

    pub fn set_rates_loaded(&mut self, loaded: bool) {
        self.rates_loaded = loaded;
    }

    /// Take the latch, or `None` when a pass is already running.
    pub fn try_begin(&self) -> Option<PropagationGuard<'_>> {
        if self.updating.replace(true) {
            return None;
        }
        Some(PropagationGuard { context: self })
    }
}

/// Scoped ownership of the propagation latch.
#[derive(Debug)]
pub struct PropagationGuard<'a> {
    context: &'a ConversionContext,
}

impl Drop for PropagationGuard<'_> {
    fn drop(&mut self) {
        self.context.updating.set(false);
    }
}
