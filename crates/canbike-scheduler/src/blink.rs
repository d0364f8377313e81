//! Turn-indicator blink phase.
//!
//! [`SignalTimer`] is a two-state machine that flips its [`BlinkPhase`] once
//! every interval. It knows nothing about indicator flags; the consumer ANDs
//! the phase with `indicator_left` / `indicator_right`.

use std::time::{Duration, Instant};

use crate::error::{SchedulerError, SchedulerResult};

/// Visible half of the blink cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkPhase {
    /// Lamps lit when their flag is set
    #[default]
    On,
    /// Lamps dark
    Off,
}

impl BlinkPhase {
    pub fn is_on(self) -> bool {
        matches!(self, BlinkPhase::On)
    }

    /// The other phase.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            BlinkPhase::On => BlinkPhase::Off,
            BlinkPhase::Off => BlinkPhase::On,
        }
    }
}

/// Periodic blink phase driven by the caller's clock.
#[derive(Debug, Clone)]
pub struct SignalTimer {
    interval: Duration,
    phase: BlinkPhase,
    last_flip: Instant,
    flips: u64,
}

impl SignalTimer {
    /// Timer that starts [`BlinkPhase::On`] at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidInterval`] for a zero interval.
    pub fn new(interval: Duration, start: Instant) -> SchedulerResult<Self> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        Ok(Self {
            interval,
            phase: BlinkPhase::On,
            last_flip: start,
            flips: 0,
        })
    }

    /// Flip the phase if a full interval has passed since the last flip.
    ///
    /// The boundary is inclusive: a call exactly one interval after the last
    /// flip flips.
    ///
    /// At most one flip happens per call, however late the call is; the next
    /// interval is measured from `now`. Returns whether a flip happened.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(elapsed) = now.checked_duration_since(self.last_flip) else {
            return false;
        };
        if elapsed < self.interval {
            return false;
        }
        self.phase = self.phase.flipped();
        self.last_flip = now;
        self.flips = self.flips.saturating_add(1);
        true
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of flips since creation.
    pub fn flips(&self) -> u64 {
        self.flips
    }
}
