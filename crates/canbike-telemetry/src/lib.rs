//! # canbike-telemetry
//!
//! Live vehicle telemetry for the canbike dashboard.
//!
//! - [`field`] - field identifiers, wire numbers and type coercion
//! - [`parser`] - tolerant `KEY:VALUE` line parser
//! - [`state`] - lock-free shared snapshot written by the serial reader
//!
//! ## Usage
//!
//! ```rust
//! use canbike_telemetry::{TelemetryState, parse_line};
//!
//! let state = TelemetryState::new();
//! for update in parse_line("SPD:12.5,RPM:3400 garbage") {
//!     state.apply(update);
//! }
//!
//! let snap = state.snapshot();
//! assert_eq!(snap.rpm, 3400);
//! assert_eq!(snap.throttle, 0);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_debug_implementations
)]

pub mod field;
pub mod parser;
pub mod state;

pub use field::{FieldKind, FieldUpdate, FieldValue, TelemetryField, WireNumber};
pub use parser::{parse_line, tokenize};
pub use state::{TelemetrySnapshot, TelemetryState};
