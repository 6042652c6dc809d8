//! Double-trigger suppression for the action route.
//!
//! A reload or a double tap on the phone must not run the hibernate script
//! twice. [`should_accept`] is the pure rule; [`LastAction`] holds the
//! timestamp and applies the rule under a lock.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

/// Decide whether a trigger at `now` may fire given the last accepted one.
///
/// Accepts when nothing was accepted yet, or when at least `cooldown` has
/// elapsed since `last`. Exactly `cooldown` counts as elapsed.
pub fn should_accept(now: Instant, last: Option<Instant>, cooldown: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= cooldown,
    }
}

/// Timestamp of the most recently accepted trigger.
///
/// Check and update happen under one lock, so two concurrent requests can
/// never both pass for the same window. The stored value only moves forward:
/// an accepted `now` is always at least `cooldown` past the previous one.
#[derive(Debug)]
pub struct LastAction {
    last: Mutex<Option<Instant>>,
    cooldown: Duration,
}

impl LastAction {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last: Mutex::new(None),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Accept and record `now` if the cooldown allows it.
    pub fn try_accept(&self, now: Instant) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        if !should_accept(now, *last, self.cooldown) {
            debug!(
                "Trigger rejected: {:?} since last accepted, cooldown {:?}",
                last.map(|l| now.saturating_duration_since(l)),
                self.cooldown
            );
            return false;
        }

        *last = Some(now);
        true
    }

    /// When the last trigger was accepted, if ever.
    pub fn last(&self) -> Option<Instant> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
