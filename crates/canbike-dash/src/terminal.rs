//! Raw-mode terminal setup and guaranteed restore.

use std::io::{self, Stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

/// Owns the terminal while the dashboard runs; restores it on drop, also
/// when unwinding.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    enhanced: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, and ask for key-release
    /// events where the terminal supports them.
    ///
    /// # Errors
    ///
    /// Any terminal I/O failure. Whatever was already switched on is undone
    /// before returning.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = crossterm::execute!(stdout, EnterAlternateScreen, Hide) {
            restore_quietly(false);
            return Err(e);
        }

        let enhanced = match supports_keyboard_enhancement() {
            Ok(true) => crossterm::execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .map(|()| true)
            .unwrap_or_else(|e| {
                warn!(error = %e, "keyboard enhancement refused");
                false
            }),
            Ok(false) => false,
            Err(e) => {
                debug!(error = %e, "keyboard enhancement query failed");
                false
            }
        };

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal, enhanced }),
            Err(e) => {
                restore_quietly(enhanced);
                Err(e)
            }
        }
    }

    /// Key releases will arrive as events.
    ///
    /// The Windows console always reports them; elsewhere only terminals
    /// that accepted the enhancement flags do.
    pub fn release_events(&self) -> bool {
        self.enhanced || cfg!(windows)
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_quietly(self.enhanced);
    }
}

fn restore_quietly(enhanced: bool) {
    let mut stdout = io::stdout();
    if enhanced && let Err(e) = crossterm::execute!(stdout, PopKeyboardEnhancementFlags) {
        warn!(error = %e, "failed to pop keyboard flags");
    }
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "failed to leave raw mode");
    }
    if let Err(e) = crossterm::execute!(stdout, LeaveAlternateScreen, Show) {
        warn!(error = %e, "failed to leave alternate screen");
    }
}
