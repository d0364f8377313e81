//! Integration tests for line parsing and state application.
//!
//! Tests verify the tolerant parser through the public API.

use canbike_telemetry::{
    FieldValue, TelemetryField, TelemetrySnapshot, TelemetryState, parse_line,
};

fn seeded_state() -> TelemetryState {
    TelemetryState::with_snapshot(TelemetrySnapshot {
        speed: 33.0,
        rpm: 1200,
        throttle: 17,
        brake: true,
        indicator_left: false,
        indicator_right: true,
        odometer: 512.25,
        fuel: 6.5,
        fuel_bars: 3,
        headlight: true,
    })
}

#[test]
fn test_round_trip_speed_and_rpm() {
    let state = seeded_state();
    let before = state.snapshot();

    state.apply_line("SPD:12.5,RPM:3400");
    let after = state.snapshot();

    assert!((after.speed - 12.5).abs() < f64::EPSILON);
    assert_eq!(after.rpm, 3400);
    for field in TelemetryField::ALL {
        if matches!(field, TelemetryField::Speed | TelemetryField::Rpm) {
            continue;
        }
        assert_eq!(after.get(field), before.get(field), "{field} changed");
    }
}

#[test]
fn test_every_recognized_key() {
    let state = TelemetryState::new();
    state.apply_line("SPD:88.8;RPM:7000;THR:255;BRK:1;L:1;R:1;ODO:1234.567;FUEL:2.75;FB:1;HL:1");
    let snap = state.snapshot();

    assert!((snap.speed - 88.8).abs() < 1e-9);
    assert_eq!(snap.rpm, 7000);
    assert_eq!(snap.throttle, 255);
    assert!(snap.brake);
    assert!(snap.indicator_left);
    assert!(snap.indicator_right);
    assert!((snap.odometer - 1234.567).abs() < 1e-9);
    assert!((snap.fuel - 2.75).abs() < 1e-9);
    assert_eq!(snap.fuel_bars, 1);
    assert!(snap.headlight);
}

#[test]
fn test_case_and_separator_insensitivity() {
    assert_eq!(parse_line("spd:10;rpm:500"), parse_line("SPD:10,RPM:500"));
    assert_eq!(parse_line("Spd : 10 , Rpm : 500"), parse_line("SPD:10;RPM:500"));
}

#[test]
fn test_unknown_key_is_ignored() {
    assert!(parse_line("FOO:9").is_empty());

    let state = seeded_state();
    let before = state.snapshot();
    assert_eq!(state.apply_line("FOO:9"), 0);
    assert_eq!(state.snapshot(), before);
}

#[test]
fn test_applying_twice_is_idempotent() {
    let line = "SPD:41.5,RPM:2200,BRK:1,FB:2";
    let once = seeded_state();
    once.apply_line(line);
    let twice = seeded_state();
    twice.apply_line(line);
    twice.apply_line(line);
    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn test_rpm_decimal_is_stored_as_integer() {
    let updates = parse_line("RPM:3400.6");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates.first().map(|u| u.value()), Some(FieldValue::Integer(3400)));
}

#[test]
fn test_repeated_key_last_wins() {
    let state = TelemetryState::new();
    state.apply_line("THR:10 THR:20 THR:30");
    assert_eq!(state.snapshot().throttle, 30);
}

#[test]
fn test_degenerate_inputs_never_fail() {
    let noise: String = std::iter::repeat_n('\u{FFFD}', 64).collect();
    let many_tokens = "X:1,".repeat(200);

    for line in ["", "   ", ":::", ",,,;;;", "SPD:", "SPD:abc", noise.as_str(), many_tokens.as_str()] {
        assert!(parse_line(line).is_empty(), "unexpected updates for {line:?}");
    }

    let torn = "PD:12.5,RP";
    assert!(parse_line(torn).is_empty());
}

#[test]
fn test_noise_around_tokens() {
    let state = TelemetryState::new();
    let applied = state.apply_line("\u{FFFD}\u{FFFD}FUEL:3.2\u{0}garbage FB:2 trailing");
    assert_eq!(applied, 2);
    let snap = state.snapshot();
    assert!((snap.fuel - 3.2).abs() < 1e-9);
    assert_eq!(snap.fuel_bars, 2);
}

#[test]
fn test_fractional_flags_are_truncated() {
    let state = seeded_state();
    state.apply_line("HL:0.5;BRK:0.9;L:-0.5;R:1.0");
    let snap = state.snapshot();
    assert!(!snap.headlight);
    assert!(!snap.brake);
    assert!(!snap.indicator_left);
    assert!(snap.indicator_right);
}

#[test]
fn test_non_ascii_digits_are_not_tokens() {
    assert!(canbike_telemetry::tokenize("SPD:\u{0661}\u{0662} RPM:\u{FF13}").is_empty());
    let state = seeded_state();
    assert_eq!(state.apply_line("SPD:\u{0661}\u{0662},RPM:900"), 1);
    assert!((state.snapshot().speed - 33.0).abs() < 1e-9);
    assert_eq!(state.snapshot().rpm, 900);
}
