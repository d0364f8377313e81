//! Read-only frame model handed to the renderer.

use canbike_link::{DIAGNOSTIC_MAX_CHARS, LinkStats, truncate_chars};
use canbike_scheduler::BlinkPhase;
use canbike_telemetry::TelemetrySnapshot;

/// Top of the speed dial, km/h.
pub const SPEED_DIAL_MAX: f64 = 120.0;
/// Top of the rev dial.
pub const RPM_DIAL_MAX: u32 = 9000;
/// Segments in the fuel gauge.
pub const FUEL_BAR_SEGMENTS: u8 = 4;

/// Everything one frame shows, derived from a snapshot and the blink phase.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Reported speed, used for the numeric readout
    pub speed: f64,
    /// Speed clamped to the dial
    pub speed_display: f64,
    pub rpm: u32,
    /// Revs clamped to the dial
    pub rpm_display: u32,
    /// Throttle as a whole percentage of 255
    pub throttle_percent: u8,
    pub brake: bool,
    pub headlight: bool,
    /// Left indicator flag AND blink phase
    pub left_lit: bool,
    /// Right indicator flag AND blink phase
    pub right_lit: bool,
    pub odometer: f64,
    pub fuel: f64,
    /// Lit fuel segments, 0 to 4
    pub fuel_bars: u8,
    /// Raw line shown on the diagnostic row, already truncated
    pub diagnostic: Option<String>,
    pub link: LinkStats,
    /// Session label shown in the title bar
    pub source: &'static str,
}

impl DashboardView {
    pub fn build(snapshot: &TelemetrySnapshot, phase: BlinkPhase) -> Self {
        let blink_on = phase.is_on();
        Self {
            speed: snapshot.speed,
            speed_display: snapshot.speed.clamp(0.0, SPEED_DIAL_MAX),
            rpm: snapshot.rpm,
            rpm_display: snapshot.rpm.min(RPM_DIAL_MAX),
            throttle_percent: throttle_percent(snapshot.throttle),
            brake: snapshot.brake,
            headlight: snapshot.headlight,
            left_lit: snapshot.indicator_left && blink_on,
            right_lit: snapshot.indicator_right && blink_on,
            odometer: snapshot.odometer,
            fuel: snapshot.fuel,
            fuel_bars: snapshot.fuel_bars.min(FUEL_BAR_SEGMENTS),
            diagnostic: None,
            link: LinkStats::default(),
            source: "live",
        }
    }

    /// Show `line` on the diagnostic row, cut to 160 characters.
    #[must_use]
    pub fn with_diagnostic(mut self, line: Option<&str>) -> Self {
        self.diagnostic = line.map(|line| truncate_chars(line, DIAGNOSTIC_MAX_CHARS));
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: LinkStats) -> Self {
        self.link = link;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    /// Speed dial fill in `0.0..=1.0`.
    pub fn speed_ratio(&self) -> f64 {
        (self.speed_display / SPEED_DIAL_MAX).clamp(0.0, 1.0)
    }

    /// Rev dial fill in `0.0..=1.0`.
    pub fn rpm_ratio(&self) -> f64 {
        (f64::from(self.rpm_display) / f64::from(RPM_DIAL_MAX)).clamp(0.0, 1.0)
    }
}

/// `thr * 100 / 255`, truncated.
pub fn throttle_percent(raw: u8) -> u8 {
    let percent = u16::from(raw) * 100 / 255;
    u8::try_from(percent).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot::default()
    }

    #[test]
    fn test_initial_snapshot_is_displayable() {
        let view = DashboardView::build(&snapshot(), BlinkPhase::On);
        assert_eq!(view.rpm_display, 0);
        assert_eq!(view.throttle_percent, 0);
        assert!(!view.left_lit && !view.right_lit);
        assert!(view.speed_ratio().abs() < f64::EPSILON);
        assert_eq!(view.diagnostic, None);
    }

    #[test]
    fn test_indicator_lit_only_in_on_phase() {
        let snap = TelemetrySnapshot {
            indicator_left: true,
            ..snapshot()
        };
        let on = DashboardView::build(&snap, BlinkPhase::On);
        let off = DashboardView::build(&snap, BlinkPhase::Off);
        assert!(on.left_lit);
        assert!(!on.right_lit);
        assert!(!off.left_lit);
    }

    #[test]
    fn test_clamps() {
        let snap = TelemetrySnapshot {
            speed: 187.4,
            rpm: 12_000,
            fuel_bars: 9,
            ..snapshot()
        };
        let view = DashboardView::build(&snap, BlinkPhase::On);
        assert!((view.speed - 187.4).abs() < f64::EPSILON);
        assert!((view.speed_display - SPEED_DIAL_MAX).abs() < f64::EPSILON);
        assert_eq!(view.rpm, 12_000);
        assert_eq!(view.rpm_display, RPM_DIAL_MAX);
        assert_eq!(view.fuel_bars, 4);
        assert!((view.rpm_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_speed_clamped_for_display() {
        let snap = TelemetrySnapshot {
            speed: -3.0,
            ..snapshot()
        };
        let view = DashboardView::build(&snap, BlinkPhase::On);
        assert!(view.speed_display.abs() < f64::EPSILON);
    }

    #[test]
    fn test_throttle_percent() {
        assert_eq!(throttle_percent(0), 0);
        assert_eq!(throttle_percent(1), 0);
        assert_eq!(throttle_percent(128), 50);
        assert_eq!(throttle_percent(254), 99);
        assert_eq!(throttle_percent(255), 100);
    }

    #[test]
    fn test_diagnostic_truncated() {
        let long = "X".repeat(200);
        let view = DashboardView::build(&snapshot(), BlinkPhase::On).with_diagnostic(Some(&long));
        let shown = view.diagnostic.unwrap_or_default();
        assert_eq!(shown.len(), 163);
        assert!(shown.ends_with("..."));
    }
}
