//! Quiet-period debouncing for text input.
//!
//! Time is always supplied by the caller, so the debouncer holds no timer and
//! never sleeps; the owner polls [`Debouncer::fire`] at or after
//! [`Debouncer::deadline`].

use std::time::{Duration, Instant};


pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl<T> Debouncer<T> {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    /// Replaces the pending value and restarts the quiet period
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.quiet_period,
        });
    }

    /// Latest input not yet fired
    pub fn echo(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value once its quiet period has elapsed
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.flush(),
            _ => None,
        }
    }

    /// Takes the pending value regardless of the deadline
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
