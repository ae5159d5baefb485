//! Trailing-edge debouncer for terminal resize bursts.
//!
//! Pure state: the caller feeds observations with their timestamps, sleeps
//! until [`Debouncer::deadline`], then calls [`Debouncer::fire`].

use std::time::{Duration, Instant};

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a value; the deadline moves to `now + window`.
    pub fn observe(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Latest value once the window has passed without new observations.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}
