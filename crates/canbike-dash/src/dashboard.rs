//! Frame-paced dashboard loop.
//!
//! Each frame drains pending terminal events, routes controls to the
//! dispatcher, advances the blink timer, snapshots telemetry and draws. The
//! loop never waits on the reader; it always shows the latest snapshot.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use canbike_link::{LastLine, LinkCounters, ShutdownToken};
use canbike_protocol::{CommandDispatcher, CommandSink, DispatchStats};
use canbike_scheduler::{FramePacer, SignalTimer};
use canbike_telemetry::TelemetryState;
use crossterm::event::{self, Event};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tracing::{debug, info};

use crate::error::DashError;
use crate::input::{InputAction, InputMapper};
use crate::render;
use crate::view::DashboardView;

/// Source of terminal events, drained once per frame.
pub trait EventSource {
    /// Every event available right now, without blocking.
    fn drain(&mut self) -> io::Result<Vec<Event>>;
}

/// Events from the real terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn drain(&mut self) -> io::Result<Vec<Event>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            events.push(event::read()?);
        }
        Ok(events)
    }
}

/// State shared with the reader thread.
#[derive(Debug, Clone, Default)]
pub struct SharedLink {
    pub state: Arc<TelemetryState>,
    pub last_line: Arc<LastLine>,
    pub counters: Arc<LinkCounters>,
}

/// Loop timing and terminal capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub frame_rate_hz: u32,
    pub blink_interval: Duration,
    pub hold_release_timeout: Duration,
    /// The terminal reports key releases
    pub release_events: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            frame_rate_hz: canbike_scheduler::DEFAULT_FRAME_RATE_HZ,
            blink_interval: canbike_scheduler::DEFAULT_BLINK_INTERVAL,
            hold_release_timeout: Duration::from_millis(crate::input::DEFAULT_HOLD_RELEASE_MS),
            release_events: false,
        }
    }
}

/// Whether the loop should keep going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Quit,
}

/// The dashboard: input, blink phase, and rendering for one session.
#[derive(Debug)]
pub struct DashboardLoop<S> {
    dispatcher: CommandDispatcher<S>,
    input: InputMapper,
    blink: SignalTimer,
    pacer: FramePacer,
    link: SharedLink,
    shutdown: ShutdownToken,
    show_diagnostic: bool,
    source: &'static str,
}

impl<S: CommandSink> DashboardLoop<S> {
    /// # Errors
    ///
    /// [`DashError::Timing`] for a zero frame rate or blink interval.
    pub fn new(
        sink: S,
        link: SharedLink,
        shutdown: ShutdownToken,
        settings: DashboardSettings,
    ) -> Result<Self, DashError> {
        let now = Instant::now();
        Ok(Self {
            dispatcher: CommandDispatcher::new(sink),
            input: InputMapper::new(settings.release_events, settings.hold_release_timeout),
            blink: SignalTimer::new(settings.blink_interval, now)?,
            pacer: FramePacer::starting_at(settings.frame_rate_hz, now)?,
            link,
            shutdown,
            show_diagnostic: false,
            source: "live",
        })
    }

    /// Label shown in the title bar.
    #[must_use]
    pub fn with_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    /// Apply one frame's events at `now`. Does not draw or sleep.
    pub fn step(&mut self, events: &[Event], now: Instant) -> StepOutcome {
        for event in events {
            let Event::Key(key) = event else {
                continue;
            };
            match self.input.map_key(key, now) {
                Some(InputAction::Control(input)) => {
                    self.dispatcher.handle(input);
                }
                Some(InputAction::ToggleDiagnostic) => {
                    self.show_diagnostic = !self.show_diagnostic;
                    debug!(show = self.show_diagnostic, "diagnostic line toggled");
                }
                Some(InputAction::Quit) => {
                    info!("quit requested");
                    self.publish_command_totals();
                    return StepOutcome::Quit;
                }
                None => {}
            }
        }

        for action in self.input.expire(now) {
            if let InputAction::Control(input) = action {
                self.dispatcher.handle(input);
            }
        }
        self.blink.advance(now);
        self.publish_command_totals();

        if self.shutdown.is_cancelled() {
            StepOutcome::Quit
        } else {
            StepOutcome::Continue
        }
    }

    /// The frame model for the current state.
    pub fn view(&self) -> DashboardView {
        let snapshot = self.link.state.snapshot();
        let diagnostic = if self.show_diagnostic {
            self.link.last_line.get()
        } else {
            None
        };
        DashboardView::build(&snapshot, self.blink.phase())
            .with_diagnostic(diagnostic.as_deref())
            .with_link(self.link.counters.snapshot())
            .with_source(self.source)
    }

    /// Run until quit or cancellation, drawing at the configured rate.
    ///
    /// # Errors
    ///
    /// [`DashError::Terminal`] if reading events or drawing fails.
    pub fn run<B: Backend, E: EventSource>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut E,
    ) -> Result<(), DashError> {
        info!(source = self.source, "dashboard running");
        while !self.shutdown.is_cancelled() {
            let pending = events.drain()?;
            if self.step(&pending, Instant::now()) == StepOutcome::Quit {
                break;
            }
            let view = self.view();
            terminal.draw(|frame| render::draw(frame, &view))?;
            self.pacer.wait_for_frame();
        }
        self.shutdown.cancel();

        let metrics = self.pacer.metrics_mut();
        let p99_late_us = metrics.p99_lateness_ns() / 1_000;
        info!(
            frames = metrics.total_frames,
            missed = metrics.missed_frames,
            p99_late_us,
            "dashboard stopped"
        );
        Ok(())
    }

    /// Release any held controls and hand back the sink.
    pub fn finish(mut self) -> (S, DispatchStats) {
        let released = self.dispatcher.release_all();
        if !released.is_empty() {
            info!(count = released.len(), "released held controls on exit");
        }
        self.publish_command_totals();
        let stats = self.dispatcher.stats();
        (self.dispatcher.into_sink(), stats)
    }

    pub fn show_diagnostic(&self) -> bool {
        self.show_diagnostic
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<S> {
        &self.dispatcher
    }

    fn publish_command_totals(&self) {
        let stats = self.dispatcher.stats();
        self.link
            .counters
            .store_command_totals(stats.sent, stats.dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canbike_scheduler::BlinkPhase;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn press(code: KeyCode) -> Event {
        key(code, KeyEventKind::Press)
    }

    fn dashboard(release_events: bool) -> Result<DashboardLoop<Vec<u8>>, DashError> {
        DashboardLoop::new(
            Vec::new(),
            SharedLink::default(),
            ShutdownToken::new(),
            DashboardSettings {
                release_events,
                ..DashboardSettings::default()
            },
        )
    }

    fn wire(dash: &DashboardLoop<Vec<u8>>) -> String {
        String::from_utf8_lossy(dash.dispatcher().sink()).into_owned()
    }

    #[test]
    fn test_held_key_sends_one_pair() -> TestResult {
        let mut dash = dashboard(true)?;
        let now = Instant::now();
        dash.step(&[press(KeyCode::Up)], now);
        for _ in 0..30 {
            dash.step(&[key(KeyCode::Up, KeyEventKind::Repeat)], now);
        }
        dash.step(&[key(KeyCode::Up, KeyEventKind::Release)], now);
        assert_eq!(wire(&dash), "UP:1\nUP:0\n");
        Ok(())
    }

    #[test]
    fn test_toggles_and_diagnostic() -> TestResult {
        let mut dash = dashboard(true)?;
        let now = Instant::now();
        let events = [
            press(KeyCode::Left),
            press(KeyCode::Right),
            press(KeyCode::Char('r')),
            press(KeyCode::Char(' ')),
            press(KeyCode::Char('d')),
        ];
        assert_eq!(dash.step(&events, now), StepOutcome::Continue);
        assert_eq!(wire(&dash), "LEFT_TOGGLE\nRIGHT_TOGGLE\nRESET_IND\nHEAD_TOGGLE\n");
        assert!(dash.show_diagnostic());
        Ok(())
    }

    #[test]
    fn test_quit_stops_processing_rest_of_frame() -> TestResult {
        let mut dash = dashboard(true)?;
        let outcome = dash.step(&[press(KeyCode::Char('q')), press(KeyCode::Left)], Instant::now());
        assert_eq!(outcome, StepOutcome::Quit);
        assert_eq!(wire(&dash), "");
        Ok(())
    }

    #[test]
    fn test_cancellation_quits() -> TestResult {
        let shutdown = ShutdownToken::new();
        let mut dash = DashboardLoop::new(
            Vec::new(),
            SharedLink::default(),
            shutdown.clone(),
            DashboardSettings::default(),
        )?;
        shutdown.cancel();
        assert_eq!(dash.step(&[], Instant::now()), StepOutcome::Quit);
        Ok(())
    }

    #[test]
    fn test_synthesized_release_without_release_events() -> TestResult {
        let mut dash = dashboard(false)?;
        let start = Instant::now();
        dash.step(&[press(KeyCode::Down)], start);
        dash.step(&[], start + Duration::from_millis(100));
        assert_eq!(wire(&dash), "DOWN:1\n");
        dash.step(&[], start + Duration::from_millis(999));
        assert_eq!(wire(&dash), "DOWN:1\n");
        dash.step(&[], start + Duration::from_millis(1000));
        assert_eq!(wire(&dash), "DOWN:1\nDOWN:0\n");
        Ok(())
    }

    #[test]
    fn test_slow_auto_repeat_is_one_hold() -> TestResult {
        let mut dash = dashboard(false)?;
        let start = Instant::now();
        let repeat = |ms: u64| (660..=1500).contains(&ms) && (ms - 660) % 40 == 0;

        dash.step(&[press(KeyCode::Up)], start);
        // 16 ms frames; X11 starts auto-repeat after 660 ms, then every 40 ms.
        let mut events = Vec::new();
        for ms in 1..=1500u64 {
            if repeat(ms) {
                events.push(press(KeyCode::Up));
            }
            if ms % 16 == 0 {
                dash.step(&events, start + Duration::from_millis(ms));
                events.clear();
            }
        }
        dash.step(&events, start + Duration::from_millis(1501));
        assert_eq!(wire(&dash), "UP:1\n");

        dash.step(&[], start + Duration::from_millis(2400));
        assert_eq!(wire(&dash), "UP:1\n");
        dash.step(&[], start + Duration::from_millis(2501));
        assert_eq!(wire(&dash), "UP:1\nUP:0\n");
        Ok(())
    }

    #[test]
    fn test_finish_releases_held_controls() -> TestResult {
        let mut dash = dashboard(true)?;
        dash.step(&[press(KeyCode::Up)], Instant::now());
        let (sink, stats) = dash.finish();
        assert_eq!(String::from_utf8_lossy(&sink), "UP:1\nUP:0\n");
        assert_eq!(stats.sent, 2);
        Ok(())
    }

    #[test]
    fn test_view_reflects_state_and_blink() -> TestResult {
        let link = SharedLink::default();
        let mut dash = DashboardLoop::new(
            Vec::new(),
            link.clone(),
            ShutdownToken::new(),
            DashboardSettings::default(),
        )?;
        link.state.apply_line("L:1,SPD:33.5");
        link.last_line.store("L:1,SPD:33.5");

        let start = Instant::now();
        let view = dash.view();
        assert!(view.left_lit);
        assert_eq!(view.diagnostic, None);

        dash.step(&[press(KeyCode::Char('d'))], start + Duration::from_millis(600));
        let view = dash.view();
        assert_eq!(dash.blink.phase(), BlinkPhase::Off);
        assert!(!view.left_lit);
        assert_eq!(view.diagnostic.as_deref(), Some("L:1,SPD:33.5"));
        Ok(())
    }

    #[test]
    fn test_command_totals_published() -> TestResult {
        let link = SharedLink::default();
        let mut dash = DashboardLoop::new(
            Vec::new(),
            link.clone(),
            ShutdownToken::new(),
            DashboardSettings::default(),
        )?;
        dash.step(&[press(KeyCode::Char(' '))], Instant::now());
        assert_eq!(link.counters.snapshot().commands_sent, 1);
        Ok(())
    }
}
