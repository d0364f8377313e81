//! Outbound command literals.
//!
//! Every command is one newline-terminated ASCII line. Hold controls carry an
//! explicit `:1`/`:0` state; toggles are bare words.

use core::fmt;
use core::str::FromStr;

use crate::error::ProtocolError;

/// Control that is held down rather than pressed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldControl {
    /// `UP`
    Accelerate,
    /// `DOWN`
    Decelerate,
}

impl HoldControl {
    /// Both hold controls.
    pub const ALL: [HoldControl; 2] = [HoldControl::Accelerate, HoldControl::Decelerate];

    /// Wire prefix before the `:1`/`:0` state.
    pub const fn wire_name(self) -> &'static str {
        match self {
            HoldControl::Accelerate => "UP",
            HoldControl::Decelerate => "DOWN",
        }
    }
}

/// Control that fires once per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleControl {
    /// `LEFT_TOGGLE`
    LeftIndicator,
    /// `RIGHT_TOGGLE`
    RightIndicator,
    /// `RESET_IND`
    ResetIndicators,
    /// `HEAD_TOGGLE`
    Headlight,
}

/// A single outbound message to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `UP:1`, `UP:0`, `DOWN:1`, `DOWN:0`
    Hold {
        /// Which control changed
        control: HoldControl,
        /// `true` on key-down, `false` on key-up
        engaged: bool,
    },
    /// `LEFT_TOGGLE`
    LeftToggle,
    /// `RIGHT_TOGGLE`
    RightToggle,
    /// `RESET_IND`
    ResetIndicators,
    /// `HEAD_TOGGLE`
    HeadlightToggle,
}

impl Command {
    /// Hold-down command for `control`.
    pub const fn engage(control: HoldControl) -> Self {
        Command::Hold {
            control,
            engaged: true,
        }
    }

    /// Release command for `control`.
    pub const fn release(control: HoldControl) -> Self {
        Command::Hold {
            control,
            engaged: false,
        }
    }

    /// Command sent for a toggle press.
    pub const fn toggle(control: ToggleControl) -> Self {
        match control {
            ToggleControl::LeftIndicator => Command::LeftToggle,
            ToggleControl::RightIndicator => Command::RightToggle,
            ToggleControl::ResetIndicators => Command::ResetIndicators,
            ToggleControl::Headlight => Command::HeadlightToggle,
        }
    }

    /// Wire bytes including the trailing newline.
    pub fn encode(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Hold { control, engaged } => {
                write!(f, "{}:{}", control.wire_name(), u8::from(*engaged))
            }
            Command::LeftToggle => f.write_str("LEFT_TOGGLE"),
            Command::RightToggle => f.write_str("RIGHT_TOGGLE"),
            Command::ResetIndicators => f.write_str("RESET_IND"),
            Command::HeadlightToggle => f.write_str("HEAD_TOGGLE"),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    /// Parse an exact wire literal; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        let command = match literal {
            "UP:1" => Command::engage(HoldControl::Accelerate),
            "UP:0" => Command::release(HoldControl::Accelerate),
            "DOWN:1" => Command::engage(HoldControl::Decelerate),
            "DOWN:0" => Command::release(HoldControl::Decelerate),
            "LEFT_TOGGLE" => Command::LeftToggle,
            "RIGHT_TOGGLE" => Command::RightToggle,
            "RESET_IND" => Command::ResetIndicators,
            "HEAD_TOGGLE" => Command::HeadlightToggle,
            other => return Err(ProtocolError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }
}
