//! Edge detection for hold controls.
//!
//! Terminals and window systems repeat key-down events while a key is held.
//! [`KeyHoldState`] collapses any number of repeats into one engage command
//! and one release command per physical hold.

use crate::command::{Command, HoldControl};

/// Per-control held flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyHoldState {
    accelerate: bool,
    decelerate: bool,
}

impl KeyHoldState {
    /// Nothing held.
    pub const fn new() -> Self {
        Self {
            accelerate: false,
            decelerate: false,
        }
    }

    fn slot(&mut self, control: HoldControl) -> &mut bool {
        match control {
            HoldControl::Accelerate => &mut self.accelerate,
            HoldControl::Decelerate => &mut self.decelerate,
        }
    }

    /// Whether `control` is currently held.
    pub fn is_held(&self, control: HoldControl) -> bool {
        match control {
            HoldControl::Accelerate => self.accelerate,
            HoldControl::Decelerate => self.decelerate,
        }
    }

    /// Key-down or repeat. Returns the engage command on the rising edge only.
    pub fn press(&mut self, control: HoldControl) -> Option<Command> {
        let held = self.slot(control);
        if *held {
            return None;
        }
        *held = true;
        Some(Command::engage(control))
    }

    /// Key-up. Returns the release command on the falling edge only.
    pub fn release(&mut self, control: HoldControl) -> Option<Command> {
        let held = self.slot(control);
        if !*held {
            return None;
        }
        *held = false;
        Some(Command::release(control))
    }

    /// Release every held control, returning the release commands.
    pub fn release_all(&mut self) -> Vec<Command> {
        HoldControl::ALL
            .into_iter()
            .filter_map(|control| self.release(control))
            .collect()
    }
}
