//! Fixed-rate frame pacing for the render loop.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{SchedulerError, SchedulerResult};
use crate::metrics::FrameMetrics;

/// Decision for one frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Time to sleep before starting the frame
    pub sleep: Duration,
    /// How far past its deadline the frame started
    pub lateness: Duration,
    /// At least one whole period was lost
    pub missed: bool,
}

/// Paces a loop to a fixed rate using absolute deadlines.
///
/// Deadlines advance by exactly one period so sleep overshoot does not
/// accumulate. When the loop falls a whole period or more behind, the
/// schedule restarts from the current time instead of bursting through the
/// backlog.
///
/// ```
/// use std::time::{Duration, Instant};
/// use canbike_scheduler::FramePacer;
///
/// let start = Instant::now();
/// let mut pacer = FramePacer::starting_at(60, start)?;
/// assert_eq!(pacer.plan(start).sleep, Duration::ZERO);
/// assert!(pacer.plan(start).sleep > Duration::ZERO);
/// # Ok::<(), canbike_scheduler::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct FramePacer {
    period: Duration,
    next_frame: Instant,
    frame_count: u64,
    metrics: FrameMetrics,
}

impl FramePacer {
    /// Pacer whose first frame is due immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidRate`] when `rate_hz` is zero.
    pub fn with_rate_hz(rate_hz: u32) -> SchedulerResult<Self> {
        Self::starting_at(rate_hz, Instant::now())
    }

    /// Pacer whose first frame is due at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidRate`] when `rate_hz` is zero.
    pub fn starting_at(rate_hz: u32, start: Instant) -> SchedulerResult<Self> {
        if rate_hz == 0 {
            return Err(SchedulerError::InvalidRate);
        }
        let period = Duration::from_secs(1) / rate_hz;
        Ok(Self {
            period,
            next_frame: start,
            frame_count: 0,
            metrics: FrameMetrics::new(),
        })
    }

    /// Work out the wait for a frame boundary observed at `now` and move the
    /// deadline forward. Does not sleep.
    pub fn plan(&mut self, now: Instant) -> FramePlan {
        let (sleep, lateness) = match self.next_frame.checked_duration_since(now) {
            Some(early) => (early, Duration::ZERO),
            None => (Duration::ZERO, now.duration_since(self.next_frame)),
        };
        let missed = lateness >= self.period;

        self.metrics.record_frame(
            u64::try_from(lateness.as_nanos()).unwrap_or(u64::MAX),
            missed,
        );
        self.frame_count = self.frame_count.saturating_add(1);

        if missed {
            trace!(lateness_ms = lateness.as_millis(), "frame deadline missed, resyncing");
            self.next_frame = now + self.period;
        } else {
            self.next_frame += self.period;
        }

        FramePlan {
            sleep,
            lateness,
            missed,
        }
    }

    /// Block until the next frame is due. Returns the frame count.
    pub fn wait_for_frame(&mut self) -> u64 {
        let plan = self.plan(Instant::now());
        if !plan.sleep.is_zero() {
            thread::sleep(plan.sleep);
        }
        self.frame_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Mutable access for percentile queries.
    pub fn metrics_mut(&mut self) -> &mut FrameMetrics {
        &mut self.metrics
    }
}
