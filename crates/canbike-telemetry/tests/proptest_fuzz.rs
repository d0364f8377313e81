//! Property-based fuzz tests for telemetry line parsing.
//!
//! Ensures the parser never panics and that well-formed lines update exactly
//! the fields they mention.

use canbike_telemetry::{TelemetryField, TelemetryState, parse_line};
use proptest::prelude::*;

fn field_strategy() -> impl Strategy<Value = TelemetryField> {
    proptest::sample::select(TelemetryField::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary text must never cause a panic.
    #[test]
    fn prop_arbitrary_text_no_panic(line in ".{0,256}") {
        let _ = parse_line(&line);
    }

    /// Arbitrary bytes decoded lossily must never cause a panic.
    #[test]
    fn prop_lossy_bytes_no_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let line = String::from_utf8_lossy(&data);
        let state = TelemetryState::new();
        let _ = state.apply_line(&line);
    }

    /// Integer tokens on integer or flag fields update exactly those fields.
    #[test]
    fn prop_mentioned_fields_updated_others_unchanged(
        entries in proptest::collection::vec((field_strategy(), 0u32..=4), 1..6),
        lowercase in any::<bool>(),
        comma in any::<bool>(),
    ) {
        let state = TelemetryState::new();
        state.apply_line("SPD:7.5;RPM:9;THR:9;BRK:1;L:1;R:1;ODO:7.5;FUEL:7.5;FB:9;HL:1");
        let before = state.snapshot();

        let separator = if comma { "," } else { ";" };
        let line = entries
            .iter()
            .map(|(field, value)| {
                let key = if lowercase {
                    field.wire_key().to_ascii_lowercase()
                } else {
                    field.wire_key().to_owned()
                };
                format!("{key}:{value}")
            })
            .collect::<Vec<_>>()
            .join(separator);

        state.apply_line(&line);
        let after = state.snapshot();

        for field in TelemetryField::ALL {
            let last = entries.iter().rev().find(|(f, _)| *f == field);
            match last {
                Some((_, value)) => {
                    prop_assert!(
                        (after.get(field).as_f64() - f64::from(*value)).abs() < 1e-9
                            || (after.get(field).as_bool() == (*value != 0)
                                && matches!(
                                    field,
                                    TelemetryField::Brake
                                        | TelemetryField::IndicatorLeft
                                        | TelemetryField::IndicatorRight
                                        | TelemetryField::Headlight
                                )),
                        "field {} expected {}", field, value
                    );
                }
                None => prop_assert_eq!(after.get(field), before.get(field)),
            }
        }
    }

    /// Applying a line twice leaves the same state as applying it once.
    #[test]
    fn prop_apply_is_idempotent(line in "[A-Za-z:;,. 0-9-]{0,128}") {
        let once = TelemetryState::new();
        once.apply_line(&line);
        let twice = TelemetryState::new();
        twice.apply_line(&line);
        twice.apply_line(&line);
        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }
}
