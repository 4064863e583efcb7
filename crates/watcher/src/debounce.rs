//! Per-path debouncing logic
//!
//! Suppresses rapid repeated triggers for the same path. The decision is
//! pure; the registry calls it inside its lock so the read of the last
//! trigger, the comparison and the update form one critical section.

use std::time::{Duration, Instant};

/// Outcome of consulting the gate for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the command; the last-trigger time has been set to now
    Accept,
    /// Within the window of the previous accepted trigger
    Suppress { remaining: Duration },
    /// No watched path covers the event
    Untracked,
}

impl Decision {
    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Debounce gate for a fixed window
#[derive(Debug, Clone, Copy)]
pub struct DebounceGate {
    window: Duration,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Initial last-trigger value for a freshly registered path
    ///
    /// `None` when `now - window` is not representable; the gate treats
    /// that as "never triggered".
    pub fn seed(&self, now: Instant) -> Option<Instant> {
        now.checked_sub(self.window)
    }

    /// Decide whether an event at `now` fires, updating `last` on accept
    ///
    /// Fires when at least `window` has elapsed since `last`. A `now`
    /// earlier than `last` counts as zero elapsed.
    pub fn check(&self, last: &mut Option<Instant>, now: Instant) -> Decision {
        if let Some(previous) = *last {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.window {
                return Decision::Suppress {
                    remaining: self.window - elapsed,
                };
            }
        }

        *last = Some(now);
        Decision::Accept
    }
}
