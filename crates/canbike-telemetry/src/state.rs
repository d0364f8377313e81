//! Shared live telemetry state.
//!
//! [`TelemetryState`] is written by the serial reader thread and read by the
//! dashboard thread. Every field lives in its own atomic, so a reader can
//! never observe a half-written value. No coherence across fields is
//! promised: a frame may see `SPD` from a new line and `RPM` from the
//! previous one.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

use crate::field::{FieldUpdate, FieldValue, TelemetryField};
use crate::parser::parse_line;

/// Plain copy of every field at one instant.
///
/// The all-zero default is the startup state and is valid for display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TelemetrySnapshot {
    /// km/h
    pub speed: f64,
    pub rpm: u32,
    /// Raw 0-255
    pub throttle: u8,
    pub brake: bool,
    pub indicator_left: bool,
    pub indicator_right: bool,
    /// km, latest report wins
    pub odometer: f64,
    /// Liters
    pub fuel: f64,
    pub fuel_bars: u8,
    pub headlight: bool,
}

impl TelemetrySnapshot {
    /// Value of one field.
    pub fn get(&self, field: TelemetryField) -> FieldValue {
        match field {
            TelemetryField::Speed => FieldValue::Float(self.speed),
            TelemetryField::Rpm => FieldValue::Integer(self.rpm),
            TelemetryField::Throttle => FieldValue::Integer(u32::from(self.throttle)),
            TelemetryField::Brake => FieldValue::Flag(self.brake),
            TelemetryField::IndicatorLeft => FieldValue::Flag(self.indicator_left),
            TelemetryField::IndicatorRight => FieldValue::Flag(self.indicator_right),
            TelemetryField::Odometer => FieldValue::Float(self.odometer),
            TelemetryField::Fuel => FieldValue::Float(self.fuel),
            TelemetryField::FuelBars => FieldValue::Integer(u32::from(self.fuel_bars)),
            TelemetryField::Headlight => FieldValue::Flag(self.headlight),
        }
    }

    /// Apply one update to this copy.
    pub fn apply(&mut self, update: FieldUpdate) {
        let value = update.value();
        match update.field() {
            TelemetryField::Speed => self.speed = value.as_f64(),
            TelemetryField::Rpm => self.rpm = value.as_u32(),
            TelemetryField::Throttle => self.throttle = saturate_u8(value),
            TelemetryField::Brake => self.brake = value.as_bool(),
            TelemetryField::IndicatorLeft => self.indicator_left = value.as_bool(),
            TelemetryField::IndicatorRight => self.indicator_right = value.as_bool(),
            TelemetryField::Odometer => self.odometer = value.as_f64(),
            TelemetryField::Fuel => self.fuel = value.as_f64(),
            TelemetryField::FuelBars => self.fuel_bars = saturate_u8(value),
            TelemetryField::Headlight => self.headlight = value.as_bool(),
        }
    }
}

fn saturate_u8(value: FieldValue) -> u8 {
    u8::try_from(value.as_u32()).unwrap_or(u8::MAX)
}

/// Lock-free live telemetry shared between the reader and the renderer.
///
/// Floats are stored as their IEEE-754 bit patterns in `AtomicU64`.
/// Relaxed ordering is sufficient: each field is independent and only
/// per-field atomicity is required.
#[derive(Debug)]
pub struct TelemetryState {
    speed: AtomicU64,
    rpm: AtomicU32,
    throttle: AtomicU8,
    brake: AtomicBool,
    indicator_left: AtomicBool,
    indicator_right: AtomicBool,
    odometer: AtomicU64,
    fuel: AtomicU64,
    fuel_bars: AtomicU8,
    headlight: AtomicBool,
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryState {
    /// All-zero state. `0u64` is the bit pattern of `0.0f64`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed: AtomicU64::new(0),
            rpm: AtomicU32::new(0),
            throttle: AtomicU8::new(0),
            brake: AtomicBool::new(false),
            indicator_left: AtomicBool::new(false),
            indicator_right: AtomicBool::new(false),
            odometer: AtomicU64::new(0),
            fuel: AtomicU64::new(0),
            fuel_bars: AtomicU8::new(0),
            headlight: AtomicBool::new(false),
        }
    }

    /// State pre-loaded from a snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: TelemetrySnapshot) -> Self {
        let state = Self::new();
        state.store_snapshot(&snapshot);
        state
    }

    /// Store a single field.
    #[inline]
    pub fn apply(&self, update: FieldUpdate) {
        let value = update.value();
        match update.field() {
            TelemetryField::Speed => store_f64(&self.speed, value.as_f64()),
            TelemetryField::Rpm => self.rpm.store(value.as_u32(), Ordering::Relaxed),
            TelemetryField::Throttle => self.throttle.store(saturate_u8(value), Ordering::Relaxed),
            TelemetryField::Brake => self.brake.store(value.as_bool(), Ordering::Relaxed),
            TelemetryField::IndicatorLeft => {
                self.indicator_left.store(value.as_bool(), Ordering::Relaxed);
            }
            TelemetryField::IndicatorRight => {
                self.indicator_right.store(value.as_bool(), Ordering::Relaxed);
            }
            TelemetryField::Odometer => store_f64(&self.odometer, value.as_f64()),
            TelemetryField::Fuel => store_f64(&self.fuel, value.as_f64()),
            TelemetryField::FuelBars => {
                self.fuel_bars.store(saturate_u8(value), Ordering::Relaxed);
            }
            TelemetryField::Headlight => self.headlight.store(value.as_bool(), Ordering::Relaxed),
        }
    }

    /// Store updates in order and return how many were applied.
    pub fn apply_all(&self, updates: &[FieldUpdate]) -> usize {
        for update in updates {
            self.apply(*update);
        }
        updates.len()
    }

    /// Parse `line` and apply whatever it yields.
    pub fn apply_line(&self, line: &str) -> usize {
        self.apply_all(&parse_line(line))
    }

    /// Read a single field.
    pub fn field(&self, field: TelemetryField) -> FieldValue {
        match field {
            TelemetryField::Speed => FieldValue::Float(load_f64(&self.speed)),
            TelemetryField::Rpm => FieldValue::Integer(self.rpm.load(Ordering::Relaxed)),
            TelemetryField::Throttle => {
                FieldValue::Integer(u32::from(self.throttle.load(Ordering::Relaxed)))
            }
            TelemetryField::Brake => FieldValue::Flag(self.brake.load(Ordering::Relaxed)),
            TelemetryField::IndicatorLeft => {
                FieldValue::Flag(self.indicator_left.load(Ordering::Relaxed))
            }
            TelemetryField::IndicatorRight => {
                FieldValue::Flag(self.indicator_right.load(Ordering::Relaxed))
            }
            TelemetryField::Odometer => FieldValue::Float(load_f64(&self.odometer)),
            TelemetryField::Fuel => FieldValue::Float(load_f64(&self.fuel)),
            TelemetryField::FuelBars => {
                FieldValue::Integer(u32::from(self.fuel_bars.load(Ordering::Relaxed)))
            }
            TelemetryField::Headlight => FieldValue::Flag(self.headlight.load(Ordering::Relaxed)),
        }
    }

    /// Copy every field.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            speed: load_f64(&self.speed),
            rpm: self.rpm.load(Ordering::Relaxed),
            throttle: self.throttle.load(Ordering::Relaxed),
            brake: self.brake.load(Ordering::Relaxed),
            indicator_left: self.indicator_left.load(Ordering::Relaxed),
            indicator_right: self.indicator_right.load(Ordering::Relaxed),
            odometer: load_f64(&self.odometer),
            fuel: load_f64(&self.fuel),
            fuel_bars: self.fuel_bars.load(Ordering::Relaxed),
            headlight: self.headlight.load(Ordering::Relaxed),
        }
    }

    /// Overwrite every field from `snapshot`.
    pub fn store_snapshot(&self, snapshot: &TelemetrySnapshot) {
        store_f64(&self.speed, snapshot.speed);
        self.rpm.store(snapshot.rpm, Ordering::Relaxed);
        self.throttle.store(snapshot.throttle, Ordering::Relaxed);
        self.brake.store(snapshot.brake, Ordering::Relaxed);
        self.indicator_left
            .store(snapshot.indicator_left, Ordering::Relaxed);
        self.indicator_right
            .store(snapshot.indicator_right, Ordering::Relaxed);
        store_f64(&self.odometer, snapshot.odometer);
        store_f64(&self.fuel, snapshot.fuel);
        self.fuel_bars.store(snapshot.fuel_bars, Ordering::Relaxed);
        self.headlight.store(snapshot.headlight, Ordering::Relaxed);
    }

    /// Return every field to zero.
    pub fn reset(&self) {
        self.store_snapshot(&TelemetrySnapshot::default());
    }
}

#[inline]
fn store_f64(slot: &AtomicU64, value: f64) {
    slot.store(value.to_bits(), Ordering::Relaxed);
}

#[inline]
fn load_f64(slot: &AtomicU64) -> f64 {
    f64::from_bits(slot.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_zero() {
        let state = TelemetryState::new();
        assert_eq!(state.snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn test_apply_line_touches_only_mentioned_fields() {
        let state = TelemetryState::new();
        state.apply_line("HL:1;FB:3");
        let applied = state.apply_line("SPD:12.5,RPM:3400");
        assert_eq!(applied, 2);

        let snap = state.snapshot();
        assert!((snap.speed - 12.5).abs() < f64::EPSILON);
        assert_eq!(snap.rpm, 3400);
        assert!(snap.headlight);
        assert_eq!(snap.fuel_bars, 3);
        assert_eq!(snap.throttle, 0);
    }

    #[test]
    fn test_field_matches_snapshot() {
        let state = TelemetryState::new();
        state.apply_line("SPD:1.5 RPM:2 THR:3 BRK:1 L:1 R:0 ODO:4.25 FUEL:5.5 FB:4 HL:1");
        let snap = state.snapshot();
        for field in TelemetryField::ALL {
            assert_eq!(state.field(field), snap.get(field), "{field}");
        }
    }

    #[test]
    fn test_snapshot_apply_matches_state_apply() {
        let state = TelemetryState::new();
        let mut copy = TelemetrySnapshot::default();
        for update in parse_line("ODO:10.5;FB:2;R:1;THR:200") {
            state.apply(update);
            copy.apply(update);
        }
        assert_eq!(state.snapshot(), copy);
    }

    #[test]
    fn test_odometer_may_regress() {
        let state = TelemetryState::new();
        state.apply_line("ODO:100.0");
        state.apply_line("ODO:99.5");
        assert!((state.snapshot().odometer - 99.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let state = TelemetryState::new();
        state.apply_line("SPD:80.0;HL:1");
        state.reset();
        assert_eq!(state.snapshot(), TelemetrySnapshot::default());
    }
}
