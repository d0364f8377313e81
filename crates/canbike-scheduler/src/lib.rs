//! Frame pacing and blink timing for the canbike dashboard.
//!
//! - [`FramePacer`] holds the render loop to a fixed rate with absolute
//!   deadlines and records lateness in [`FrameMetrics`].
//! - [`SignalTimer`] produces the indicator [`BlinkPhase`] from the caller's
//!   clock, flipping at most once per interval.
//!
//! Neither type reads the clock on its own except
//! [`FramePacer::wait_for_frame`]; everything else takes an `Instant`, so
//! timing behavior is testable without sleeping.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod blink;
pub mod error;
pub mod metrics;
pub mod pacer;

pub use blink::{BlinkPhase, SignalTimer};
pub use error::{SchedulerError, SchedulerResult};
pub use metrics::FrameMetrics;
pub use pacer::{FramePacer, FramePlan};

use std::time::Duration;

/// Render rate of the dashboard.
pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;

/// Half-period of the indicator blink.
pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);
