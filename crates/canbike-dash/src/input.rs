//! Keyboard mapping.
//!
//! | key | action |
//! |---|---|
//! | `Up` (hold) | accelerate |
//! | `Down` (hold) | decelerate |
//! | `Left` / `Right` | indicator toggles |
//! | `R` | cancel indicators |
//! | `Space` | headlight toggle |
//! | `D` | diagnostic line on/off |
//! | `Q`, `Esc`, `Ctrl-C` | quit |
//!
//! Terminals without key-release reporting only send repeated presses while
//! a key is held. For those, a hold is released once no press or repeat has
//! arrived for the hold timeout, which has to be longer than the delay before
//! auto-repeat starts.

use std::time::{Duration, Instant};

use canbike_protocol::{ControlInput, HoldControl, ToggleControl};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Quiet period before a synthesized release, in milliseconds.
///
/// Must exceed the terminal's auto-repeat delay (660 ms on X11, up to
/// 1000 ms on other desktops) or one physical hold reads as two.
pub const DEFAULT_HOLD_RELEASE_MS: u64 = 1000;

/// What a key means to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Forward to the command dispatcher
    Control(ControlInput),
    /// Show or hide the raw line
    ToggleDiagnostic,
    Quit,
}

/// Turns terminal key events into [`InputAction`]s.
#[derive(Debug, Clone)]
pub struct InputMapper {
    release_events: bool,
    hold_timeout: Duration,
    accelerate_seen: Option<Instant>,
    decelerate_seen: Option<Instant>,
}

impl InputMapper {
    /// `release_events` says whether the terminal reports key releases.
    pub fn new(release_events: bool, hold_timeout: Duration) -> Self {
        Self {
            release_events,
            hold_timeout,
            accelerate_seen: None,
            decelerate_seen: None,
        }
    }

    pub fn release_events(&self) -> bool {
        self.release_events
    }

    pub fn map_key(&mut self, key: &KeyEvent, now: Instant) -> Option<InputAction> {
        match key.kind {
            KeyEventKind::Release => {
                let control = hold_control(key.code)?;
                *self.seen_mut(control) = None;
                Some(InputAction::Control(ControlInput::Release(control)))
            }
            KeyEventKind::Repeat => {
                let control = hold_control(key.code)?;
                *self.seen_mut(control) = Some(now);
                Some(InputAction::Control(ControlInput::Press(control)))
            }
            KeyEventKind::Press => self.map_press(key, now),
        }
    }

    fn map_press(&mut self, key: &KeyEvent, now: Instant) -> Option<InputAction> {
        if let Some(control) = hold_control(key.code) {
            *self.seen_mut(control) = Some(now);
            return Some(InputAction::Control(ControlInput::Press(control)));
        }
        let toggle = |control| Some(InputAction::Control(ControlInput::Toggle(control)));
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(InputAction::Quit)
            }
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(InputAction::Quit),
            KeyCode::Left => toggle(ToggleControl::LeftIndicator),
            KeyCode::Right => toggle(ToggleControl::RightIndicator),
            KeyCode::Char('r' | 'R') => toggle(ToggleControl::ResetIndicators),
            KeyCode::Char(' ') => toggle(ToggleControl::Headlight),
            KeyCode::Char('d' | 'D') => Some(InputAction::ToggleDiagnostic),
            _ => None,
        }
    }

    /// Releases synthesized for holds that went quiet. Always empty when the
    /// terminal reports real releases.
    pub fn expire(&mut self, now: Instant) -> Vec<InputAction> {
        if self.release_events {
            return Vec::new();
        }
        let timeout = self.hold_timeout;
        HoldControl::ALL
            .into_iter()
            .filter(|control| {
                let seen = self.seen_mut(*control);
                match *seen {
                    Some(at) if now.saturating_duration_since(at) >= timeout => {
                        *seen = None;
                        true
                    }
                    _ => false,
                }
            })
            .map(|control| InputAction::Control(ControlInput::Release(control)))
            .collect()
    }

    fn seen_mut(&mut self, control: HoldControl) -> &mut Option<Instant> {
        match control {
            HoldControl::Accelerate => &mut self.accelerate_seen,
            HoldControl::Decelerate => &mut self.decelerate_seen,
        }
    }
}

fn hold_control(code: KeyCode) -> Option<HoldControl> {
    match code {
        KeyCode::Up => Some(HoldControl::Accelerate),
        KeyCode::Down => Some(HoldControl::Decelerate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    const HOLD: Duration = Duration::from_millis(600);

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyEventKind::Press)
    }

    fn control(input: ControlInput) -> Option<InputAction> {
        Some(InputAction::Control(input))
    }

    #[test]
    fn test_key_map() {
        let mut mapper = InputMapper::new(true, HOLD);
        let now = Instant::now();
        let cases = [
            (KeyCode::Up, control(ControlInput::Press(HoldControl::Accelerate))),
            (KeyCode::Down, control(ControlInput::Press(HoldControl::Decelerate))),
            (KeyCode::Left, control(ControlInput::Toggle(ToggleControl::LeftIndicator))),
            (KeyCode::Right, control(ControlInput::Toggle(ToggleControl::RightIndicator))),
            (KeyCode::Char('r'), control(ControlInput::Toggle(ToggleControl::ResetIndicators))),
            (KeyCode::Char('R'), control(ControlInput::Toggle(ToggleControl::ResetIndicators))),
            (KeyCode::Char(' '), control(ControlInput::Toggle(ToggleControl::Headlight))),
            (KeyCode::Char('d'), Some(InputAction::ToggleDiagnostic)),
            (KeyCode::Char('q'), Some(InputAction::Quit)),
            (KeyCode::Esc, Some(InputAction::Quit)),
            (KeyCode::Char('x'), None),
            (KeyCode::Enter, None),
        ];
        for (code, expected) in cases {
            assert_eq!(mapper.map_key(&press(code), now), expected, "{code:?}");
        }
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut mapper = InputMapper::new(false, HOLD);
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(mapper.map_key(&event, Instant::now()), Some(InputAction::Quit));
    }

    #[test]
    fn test_release_events_pass_through() {
        let mut mapper = InputMapper::new(true, HOLD);
        let now = Instant::now();
        assert_eq!(
            mapper.map_key(&key(KeyCode::Down, KeyEventKind::Release), now),
            control(ControlInput::Release(HoldControl::Decelerate))
        );
        assert_eq!(mapper.map_key(&key(KeyCode::Left, KeyEventKind::Release), now), None);
        assert_eq!(mapper.map_key(&key(KeyCode::Left, KeyEventKind::Repeat), now), None);
    }

    #[test]
    fn test_no_synthesis_with_release_events() {
        let mut mapper = InputMapper::new(true, HOLD);
        let now = Instant::now();
        mapper.map_key(&press(KeyCode::Up), now);
        assert!(mapper.expire(now + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_synthesized_release_after_quiet_period() {
        let mut mapper = InputMapper::new(false, HOLD);
        let start = Instant::now();
        mapper.map_key(&press(KeyCode::Up), start);

        // Auto-repeat keeps the hold alive.
        for ms in [100u64, 400, 700, 1000] {
            let at = start + Duration::from_millis(ms);
            assert!(mapper.expire(at).is_empty(), "{ms}ms");
            mapper.map_key(&press(KeyCode::Up), at);
        }

        let quiet = start + Duration::from_millis(1000) + HOLD;
        assert_eq!(
            mapper.expire(quiet),
            vec![InputAction::Control(ControlInput::Release(HoldControl::Accelerate))]
        );
        assert!(mapper.expire(quiet + HOLD).is_empty());
    }

    #[test]
    fn test_each_hold_expires_independently() {
        let mut mapper = InputMapper::new(false, HOLD);
        let start = Instant::now();
        mapper.map_key(&press(KeyCode::Up), start);
        mapper.map_key(&press(KeyCode::Down), start + Duration::from_millis(300));

        assert_eq!(
            mapper.expire(start + HOLD),
            vec![InputAction::Control(ControlInput::Release(HoldControl::Accelerate))]
        );
        assert_eq!(
            mapper.expire(start + HOLD + Duration::from_millis(300)),
            vec![InputAction::Control(ControlInput::Release(HoldControl::Decelerate))]
        );
    }
}
