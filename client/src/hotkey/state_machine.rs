//! Per-shortcut press/release/hold/toggle state machine (spec §4.5, C9).
//!
//! Grounded on the original `ShortcutTask`/`ShortcutManager` pair
//! (`shortcut/task.py`, `shortcut/shortcut_manager.py`): there the state
//! lived in a `threading.Timer` plus a few booleans exchanged over a
//! queue. Here the same three transitions are expressed as a small
//! synchronous state machine driven by `on_key_down`/`on_key_up`, kept
//! free of any I/O so it can be unit tested without a real keyboard.

use std::time::{Duration, Instant};

use crate::config::ShortcutConfig;

/// What the owner of a [`ShortcutState`] should do in response to an
/// event. The state machine never performs I/O itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Spawn a new recording session now.
    Begin,
    /// Abandon the in-flight session; no `is_final` chunk, no result.
    Cancel,
    /// Flush the in-flight session as final and await its result.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Toggle mode only: key is down, waiting past `threshold` before the
    /// recording actually starts (guards against an accidental tap).
    PendingToggleOn { since: Instant },
    Recording { started_at: Instant },
}

/// Drives one [`ShortcutConfig`]'s press lifecycle. At most one shortcut
/// across a whole [`super::HotkeyListener`] set may be `Recording` at a
/// time (spec §3 invariant); enforcing that is the caller's job.
#[derive(Debug)]
pub struct ShortcutState {
    hold_mode: bool,
    threshold: Duration,
    state: State,
}

impl ShortcutState {
    pub fn new(config: &ShortcutConfig, default_threshold: f32) -> Self {
        let threshold = config.threshold.unwrap_or(default_threshold).max(0.0);
        Self {
            hold_mode: config.hold_mode,
            threshold: Duration::from_secs_f32(threshold),
            state: State::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Key-down handling. Returns `Some(Action::Begin)` exactly when a new
    /// recording session should be spawned right now.
    pub fn on_key_down(&mut self, now: Instant) -> Option<Action> {
        match self.state {
            State::Idle if self.hold_mode => {
                self.state = State::Recording { started_at: now };
                Some(Action::Begin)
            }
            State::Idle => {
                self.state = State::PendingToggleOn { since: now };
                None
            }
            // Already down / recording: key-repeat events are ignored.
            State::PendingToggleOn { .. } | State::Recording { .. } => None,
        }
    }

    /// Key-up handling.
    pub fn on_key_up(&mut self, now: Instant) -> Option<Action> {
        match self.state {
            State::Idle => None,
            State::Recording { started_at } if self.hold_mode => {
                self.state = State::Idle;
                if now.saturating_duration_since(started_at) < self.threshold {
                    Some(Action::Cancel)
                } else {
                    Some(Action::Finish)
                }
            }
            State::PendingToggleOn { since } => {
                // First release of a toggle pair: too short is an
                // accidental tap, stay idle; otherwise the recording
                // actually begins now.
                if now.saturating_duration_since(since) < self.threshold {
                    self.state = State::Idle;
                    None
                } else {
                    self.state = State::Recording { started_at: now };
                    Some(Action::Begin)
                }
            }
            State::Recording { .. } => {
                // Second release of a toggle pair: stop.
                self.state = State::Idle;
                Some(Action::Finish)
            }
        }
    }

    /// Whether a cancelled tap should be masked with an emulated key tap
    /// (spec §4.5: "if suppress=true AND the press was cancelled as a
    /// tap: emulate a single tap of the key").
    pub fn should_emulate_tap(config: &ShortcutConfig, action: Action) -> bool {
        config.suppress && action == Action::Cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold_config() -> ShortcutConfig {
        ShortcutConfig {
            hold_mode: true,
            threshold: Some(0.3),
            ..ShortcutConfig::default()
        }
    }

    fn toggle_config() -> ShortcutConfig {
        ShortcutConfig {
            hold_mode: false,
            threshold: Some(0.3),
            ..ShortcutConfig::default()
        }
    }

    #[test]
    fn hold_mode_begins_immediately_on_key_down() {
        let mut sm = ShortcutState::new(&hold_config(), 0.3);
        let t0 = Instant::now();
        assert_eq!(sm.on_key_down(t0), Some(Action::Begin));
        assert!(sm.is_recording());
    }

    #[test]
    fn hold_mode_short_press_is_cancelled() {
        let mut sm = ShortcutState::new(&hold_config(), 0.3);
        let t0 = Instant::now();
        sm.on_key_down(t0);
        let action = sm.on_key_up(t0 + Duration::from_millis(100));
        assert_eq!(action, Some(Action::Cancel));
        assert!(!sm.is_recording());
    }

    #[test]
    fn hold_mode_long_press_is_finished() {
        let mut sm = ShortcutState::new(&hold_config(), 0.3);
        let t0 = Instant::now();
        sm.on_key_down(t0);
        let action = sm.on_key_up(t0 + Duration::from_millis(500));
        assert_eq!(action, Some(Action::Finish));
    }

    #[test]
    fn toggle_mode_short_first_release_stays_idle() {
        let mut sm = ShortcutState::new(&toggle_config(), 0.3);
        let t0 = Instant::now();
        assert_eq!(sm.on_key_down(t0), None);
        let action = sm.on_key_up(t0 + Duration::from_millis(50));
        assert_eq!(action, None);
        assert!(!sm.is_recording());
    }

    #[test]
    fn toggle_mode_two_clicks_start_then_stop() {
        let mut sm = ShortcutState::new(&toggle_config(), 0.3);
        let t0 = Instant::now();
        sm.on_key_down(t0);
        let begin = sm.on_key_up(t0 + Duration::from_millis(400));
        assert_eq!(begin, Some(Action::Begin));
        assert!(sm.is_recording());

        let t1 = t0 + Duration::from_secs(2);
        sm.on_key_down(t1);
        let finish = sm.on_key_up(t1 + Duration::from_millis(50));
        assert_eq!(finish, Some(Action::Finish));
        assert!(!sm.is_recording());
    }

    #[test]
    fn emulate_tap_only_when_suppressed_and_cancelled() {
        let suppressed = ShortcutConfig {
            suppress: true,
            ..ShortcutConfig::default()
        };
        let unsuppressed = ShortcutConfig {
            suppress: false,
            ..ShortcutConfig::default()
        };
        assert!(ShortcutState::should_emulate_tap(
            &suppressed,
            Action::Cancel
        ));
        assert!(!ShortcutState::should_emulate_tap(
            &unsuppressed,
            Action::Cancel
        ));
        assert!(!ShortcutState::should_emulate_tap(
            &suppressed,
            Action::Finish
        ));
    }
}
