//! Telemetry field identifiers, wire numbers and coerced values.
//!
//! The controller reports each field as `KEY:NUMBER`. This module owns the
//! mapping from wire keys to [`TelemetryField`] and the coercion of a raw
//! [`WireNumber`] into the field's declared storage type.

use core::fmt;

use serde::Serialize;

/// A field of the live vehicle snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryField {
    /// Road speed in km/h (`SPD`)
    Speed,
    /// Engine speed (`RPM`)
    Rpm,
    /// Raw throttle position 0-255 (`THR`)
    Throttle,
    /// Brake switch (`BRK`)
    Brake,
    /// Left turn indicator (`L`)
    IndicatorLeft,
    /// Right turn indicator (`R`)
    IndicatorRight,
    /// Cumulative distance in km (`ODO`)
    Odometer,
    /// Fuel remaining in liters (`FUEL`)
    Fuel,
    /// Discretized fuel level 0-4 (`FB`)
    FuelBars,
    /// Headlight switch (`HL`)
    Headlight,
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as `f64`
    Float,
    /// Stored as a non-negative integer
    Integer,
    /// Stored as `bool`; the wire carries 0/1
    Flag,
}

impl TelemetryField {
    /// Every field, in wire documentation order.
    pub const ALL: [TelemetryField; 10] = [
        TelemetryField::Speed,
        TelemetryField::Rpm,
        TelemetryField::Throttle,
        TelemetryField::Brake,
        TelemetryField::IndicatorLeft,
        TelemetryField::IndicatorRight,
        TelemetryField::Odometer,
        TelemetryField::Fuel,
        TelemetryField::FuelBars,
        TelemetryField::Headlight,
    ];

    /// Upper-case key used on the wire.
    pub const fn wire_key(self) -> &'static str {
        match self {
            TelemetryField::Speed => "SPD",
            TelemetryField::Rpm => "RPM",
            TelemetryField::Throttle => "THR",
            TelemetryField::Brake => "BRK",
            TelemetryField::IndicatorLeft => "L",
            TelemetryField::IndicatorRight => "R",
            TelemetryField::Odometer => "ODO",
            TelemetryField::Fuel => "FUEL",
            TelemetryField::FuelBars => "FB",
            TelemetryField::Headlight => "HL",
        }
    }

    /// Look up a wire key, ignoring ASCII case.
    pub fn from_wire_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.wire_key().eq_ignore_ascii_case(key))
    }

    /// Declared storage type.
    pub const fn kind(self) -> FieldKind {
        match self {
            TelemetryField::Speed | TelemetryField::Odometer | TelemetryField::Fuel => {
                FieldKind::Float
            }
            TelemetryField::Rpm | TelemetryField::Throttle | TelemetryField::FuelBars => {
                FieldKind::Integer
            }
            TelemetryField::Brake
            | TelemetryField::IndicatorLeft
            | TelemetryField::IndicatorRight
            | TelemetryField::Headlight => FieldKind::Flag,
        }
    }

    /// Largest integer the field can hold.
    const fn integer_max(self) -> i64 {
        match self {
            TelemetryField::Throttle | TelemetryField::FuelBars => u8::MAX as i64,
            _ => u32::MAX as i64,
        }
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

/// A number exactly as the controller wrote it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireNumber {
    /// Token without a decimal point
    Int(i64),
    /// Token with a decimal point
    Float(f64),
}

impl WireNumber {
    /// Parse a numeric token.
    ///
    /// A token containing `.` is read as a float, anything else as an
    /// integer. Returns `None` for tokens that do not parse or that overflow
    /// to a non-finite float.
    pub fn parse(token: &str) -> Option<Self> {
        if token.contains('.') {
            token
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(WireNumber::Float)
        } else {
            token.parse::<i64>().ok().map(WireNumber::Int)
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            WireNumber::Int(value) => value as f64,
            WireNumber::Float(value) => value,
        }
    }

    /// Integer value, truncating any fractional part toward zero.
    fn as_i64(self) -> i64 {
        match self {
            WireNumber::Int(value) => value,
            // `as` saturates at the i64 bounds; the clamp below narrows further.
            WireNumber::Float(value) => value.trunc() as i64,
        }
    }

}

/// A value already coerced to its field's storage type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Float field value
    Float(f64),
    /// Integer field value
    Integer(u32),
    /// Flag field value
    Flag(bool),
}

impl FieldValue {
    /// The value as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::Float(value) => value,
            FieldValue::Integer(value) => f64::from(value),
            FieldValue::Flag(value) => f64::from(u8::from(value)),
        }
    }

    /// The value as an unsigned integer, truncating and saturating floats.
    pub fn as_u32(self) -> u32 {
        match self {
            FieldValue::Float(value) => value.trunc().clamp(0.0, f64::from(u32::MAX)) as u32,
            FieldValue::Integer(value) => value,
            FieldValue::Flag(value) => u32::from(value),
        }
    }

    /// The value as a flag; any non-zero value is `true`.
    pub fn as_bool(self) -> bool {
        match self {
            FieldValue::Float(value) => value != 0.0,
            FieldValue::Integer(value) => value != 0,
            FieldValue::Flag(value) => value,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Flag(value) => write!(f, "{}", u8::from(*value)),
        }
    }
}

/// One `(field, value)` pair extracted from a telemetry line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldUpdate {
    field: TelemetryField,
    value: FieldValue,
}

impl FieldUpdate {
    /// Coerce a wire number into `field`'s storage type.
    ///
    /// Integer fields truncate decimals and clamp into their range. Flag
    /// fields are integers on the wire: the number is truncated first, and
    /// any non-zero result is set, so `HL:0.5` is off.
    pub fn coerce(field: TelemetryField, number: WireNumber) -> Self {
        let value = match field.kind() {
            FieldKind::Float => FieldValue::Float(number.as_f64()),
            FieldKind::Integer => {
                let clamped = number.as_i64().clamp(0, field.integer_max());
                FieldValue::Integer(u32::try_from(clamped).unwrap_or(u32::MAX))
            }
            FieldKind::Flag => FieldValue::Flag(number.as_i64() != 0),
        };
        Self { field, value }
    }

    /// Field being updated.
    pub fn field(&self) -> TelemetryField {
        self.field
    }

    /// Coerced value.
    pub fn value(&self) -> FieldValue {
        self.value
    }
}

impl fmt::Display for FieldUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}
