//! Property-based tests for frame pacing and blink timing.

use std::time::{Duration, Instant};

use canbike_scheduler::{BlinkPhase, FrameMetrics, FramePacer, SignalTimer};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever the frame cadence, the phase never changes twice within one
    /// interval and the flip count matches the observed phase.
    #[test]
    fn prop_blink_never_flips_within_interval(
        interval_ms in 50u64..2_000,
        steps in proptest::collection::vec(0u64..700, 1..400),
    ) {
        let interval = Duration::from_millis(interval_ms);
        let start = Instant::now();
        let mut timer = SignalTimer::new(interval, start)?;

        let mut now = start;
        let mut last_flip = start;
        for step in steps {
            now += Duration::from_millis(step);
            if timer.advance(now) {
                prop_assert!(now.duration_since(last_flip) >= interval);
                last_flip = now;
            }
        }

        let expected = if timer.flips() % 2 == 0 { BlinkPhase::On } else { BlinkPhase::Off };
        prop_assert_eq!(timer.phase(), expected);
    }

    /// A steady frame cadence flips once per interval, rounded to frames.
    #[test]
    fn prop_blink_rate_matches_interval(frame_ms in 1u64..50, frames in 100u32..2_000) {
        let interval = Duration::from_millis(500);
        let frame = Duration::from_millis(frame_ms);
        let start = Instant::now();
        let mut timer = SignalTimer::new(interval, start)?;

        for i in 1..=frames {
            timer.advance(start + frame * i);
        }

        let frames_per_flip = 500u64.div_ceil(frame_ms);
        prop_assert_eq!(timer.flips(), u64::from(frames) / frames_per_flip);
    }

    /// Planned sleeps never exceed one period.
    #[test]
    fn prop_pacer_sleep_bounded(
        rate_hz in 1u32..240,
        work_us in proptest::collection::vec(0u64..50_000, 1..200),
    ) {
        let start = Instant::now();
        let mut pacer = FramePacer::starting_at(rate_hz, start)?;
        let mut now = start;
        for work in work_us {
            let plan = pacer.plan(now);
            prop_assert!(plan.sleep <= pacer.period());
            prop_assert!(plan.sleep.is_zero() || plan.lateness.is_zero());
            now += plan.sleep + Duration::from_micros(work);
        }
    }

    #[test]
    fn prop_percentiles_monotonic(samples in proptest::collection::vec(0u64..100_000_000, 1..500)) {
        let mut metrics = FrameMetrics::with_capacity(samples.len());
        for sample in &samples {
            metrics.record_frame(*sample, false);
        }
        let p50 = metrics.percentile_lateness_ns(50);
        let p95 = metrics.percentile_lateness_ns(95);
        let p99 = metrics.p99_lateness_ns();
        prop_assert!(p50 <= p95);
        prop_assert!(p95 <= p99);
        prop_assert!(p99 <= metrics.max_lateness_ns);
    }
}
