//! Fire-and-forget command dispatch.
//!
//! The dispatcher turns operator input transitions into wire commands and
//! writes them straight to the outbound transport. Write failures are
//! counted and dropped; the render loop never sees them.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::command::{Command, HoldControl, ToggleControl};
use crate::key_hold::KeyHoldState;

/// Outbound transport seam.
pub trait CommandSink {
    /// Write one encoded command line.
    fn write_command(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: Write> CommandSink for W {
    fn write_command(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }
}

/// Operator input after key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    /// Key-down or auto-repeat of a hold control
    Press(HoldControl),
    /// Key-up of a hold control
    Release(HoldControl),
    /// Single press of a toggle control
    Toggle(ToggleControl),
}

/// Outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands written successfully
    pub sent: u64,
    /// Commands lost to a write failure
    pub dropped: u64,
}

/// Translates input transitions into outbound commands.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    sink: S,
    keys: KeyHoldState,
    stats: DispatchStats,
}

impl<S: CommandSink> CommandDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            keys: KeyHoldState::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Route one input. Returns the command that was attempted, if any.
    pub fn handle(&mut self, input: ControlInput) -> Option<Command> {
        match input {
            ControlInput::Press(control) => self.press_hold(control),
            ControlInput::Release(control) => self.release_hold(control),
            ControlInput::Toggle(control) => Some(self.toggle(control)),
        }
    }

    /// Hold control went down; only the first press of a hold is sent.
    pub fn press_hold(&mut self, control: HoldControl) -> Option<Command> {
        let command = self.keys.press(control)?;
        self.send(command);
        Some(command)
    }

    /// Hold control went up; only sent if the control was held.
    pub fn release_hold(&mut self, control: HoldControl) -> Option<Command> {
        let command = self.keys.release(control)?;
        self.send(command);
        Some(command)
    }

    /// Toggle pressed; always sent.
    pub fn toggle(&mut self, control: ToggleControl) -> Command {
        let command = Command::toggle(control);
        self.send(command);
        command
    }

    /// Release every held control, e.g. before closing the port.
    pub fn release_all(&mut self) -> Vec<Command> {
        let commands = self.keys.release_all();
        for command in &commands {
            self.send(*command);
        }
        commands
    }

    /// Write `command`. Returns `false` if the write failed; the failure is
    /// otherwise swallowed.
    pub fn send(&mut self, command: Command) -> bool {
        match self.sink.write_command(&command.encode()) {
            Ok(()) => {
                trace!(%command, "command sent");
                self.stats.sent = self.stats.sent.saturating_add(1);
                true
            }
            Err(e) => {
                debug!(%command, error = %e, "command dropped");
                self.stats.dropped = self.stats.dropped.saturating_add(1);
                false
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn key_state(&self) -> &KeyHoldState {
        &self.keys
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
