//! Outbound command protocol for the canbike controller link.
//!
//! The dashboard talks back to the controller with single ASCII lines:
//!
//! | input | wire |
//! |---|---|
//! | accelerate held / released | `UP:1` / `UP:0` |
//! | decelerate held / released | `DOWN:1` / `DOWN:0` |
//! | left indicator | `LEFT_TOGGLE` |
//! | right indicator | `RIGHT_TOGGLE` |
//! | cancel indicators | `RESET_IND` |
//! | headlight | `HEAD_TOGGLE` |
//!
//! Delivery is not acknowledged. A failed write is dropped.
//!
//! # Example
//!
//! ```
//! use canbike_protocol::{CommandDispatcher, ControlInput, HoldControl};
//!
//! let mut dispatcher = CommandDispatcher::new(Vec::new());
//! dispatcher.handle(ControlInput::Press(HoldControl::Accelerate));
//! dispatcher.handle(ControlInput::Press(HoldControl::Accelerate));
//! dispatcher.handle(ControlInput::Release(HoldControl::Accelerate));
//! assert_eq!(dispatcher.sink().as_slice(), b"UP:1\nUP:0\n");
//! ```

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod key_hold;

pub use command::{Command, HoldControl, ToggleControl};
pub use dispatcher::{CommandDispatcher, CommandSink, ControlInput, DispatchStats};
pub use error::ProtocolError;
pub use key_hold::KeyHoldState;
