//! Terminal dashboard for a CAN bike.
//!
//! Telemetry arrives on the actuator controller's serial port and is read
//! on a background thread into a shared state. The dashboard redraws from
//! that state at a fixed frame rate and writes operator commands to the
//! engine controller's port. A recorded raw line log can be replayed
//! through the same path.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod render;
pub mod replay;
pub mod terminal;
pub mod view;

pub use config::{ConfigOverrides, DashConfig};
pub use dashboard::{
    CrosstermEvents, DashboardLoop, DashboardSettings, EventSource, SharedLink, StepOutcome,
};
pub use error::{ConfigError, DashError};
pub use input::{InputAction, InputMapper};
pub use replay::ReplaySource;
pub use view::DashboardView;
