//! C9 — global hotkey listening and the per-shortcut state machine.
//!
//! Builds on `voice-to-text`'s single-key `rdev::listen` design
//! (`hotkey::listener::HotkeyListener`), generalised to (a) any number of
//! concurrently-armed [`ShortcutConfig`]s, (b) mouse buttons as well as
//! keyboard keys, and (c) event suppression, which needs `rdev::grab`
//! rather than the read-only `rdev::listen`.

pub mod listener;
pub mod state_machine;

pub use listener::HotkeyListener;
pub use state_machine::{Action, ShortcutState};

use crate::config::{ShortcutConfig, ShortcutKind};

/// A parsed, device-agnostic key/button binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKey {
    Key(rdev::Key),
    Button(rdev::Button),
}

/// An event raised by the listener thread: `index` identifies which
/// configured shortcut's binding matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEvent {
    pub index: usize,
    pub down: bool,
}

/// Resolve a [`ShortcutConfig`]'s textual `key` into a [`BoundKey`],
/// returning `None` for unrecognised names (caller should skip the
/// shortcut and log a warning rather than fail startup).
pub fn parse_binding(config: &ShortcutConfig) -> Option<BoundKey> {
    match config.kind {
        ShortcutKind::Keyboard => parse_key(&config.key).map(BoundKey::Key),
        ShortcutKind::Mouse => parse_button(&config.key).map(BoundKey::Button),
    }
}

/// Parse a hotkey name from a config string into an [`rdev::Key`].
/// Supports F1-F12, common named keys, lock/modifier keys, and single
/// ASCII letters — the superset `voice-to-text`'s `parse_key` covers,
/// with the lock/modifier keys this project's toggle shortcuts need.
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    match key_str {
        "F1" => Some(rdev::Key::F1),
        "F2" => Some(rdev::Key::F2),
        "F3" => Some(rdev::Key::F3),
        "F4" => Some(rdev::Key::F4),
        "F5" => Some(rdev::Key::F5),
        "F6" => Some(rdev::Key::F6),
        "F7" => Some(rdev::Key::F7),
        "F8" => Some(rdev::Key::F8),
        "F9" => Some(rdev::Key::F9),
        "F10" => Some(rdev::Key::F10),
        "F11" => Some(rdev::Key::F11),
        "F12" => Some(rdev::Key::F12),

        "Escape" | "Esc" => Some(rdev::Key::Escape),
        "Space" => Some(rdev::Key::Space),
        "Return" | "Enter" => Some(rdev::Key::Return),
        "Tab" => Some(rdev::Key::Tab),
        "Backspace" => Some(rdev::Key::Backspace),
        "Delete" | "Del" => Some(rdev::Key::Delete),

        "CapsLock" => Some(rdev::Key::CapsLock),
        "NumLock" => Some(rdev::Key::NumLock),
        "ScrollLock" => Some(rdev::Key::ScrollLock),
        "Shift" => Some(rdev::Key::ShiftLeft),
        "Control" => Some(rdev::Key::ControlLeft),
        "Alt" => Some(rdev::Key::Alt),
        "Meta" => Some(rdev::Key::MetaLeft),

        "A" | "a" => Some(rdev::Key::KeyA),
        "B" | "b" => Some(rdev::Key::KeyB),
        "C" | "c" => Some(rdev::Key::KeyC),
        "D" | "d" => Some(rdev::Key::KeyD),
        "E" | "e" => Some(rdev::Key::KeyE),
        "F" | "f" => Some(rdev::Key::KeyF),
        "G" | "g" => Some(rdev::Key::KeyG),
        "H" | "h" => Some(rdev::Key::KeyH),
        "I" | "i" => Some(rdev::Key::KeyI),
        "J" | "j" => Some(rdev::Key::KeyJ),
        "K" | "k" => Some(rdev::Key::KeyK),
        "L" | "l" => Some(rdev::Key::KeyL),
        "M" | "m" => Some(rdev::Key::KeyM),
        "N" | "n" => Some(rdev::Key::KeyN),
        "O" | "o" => Some(rdev::Key::KeyO),
        "P" | "p" => Some(rdev::Key::KeyP),
        "Q" | "q" => Some(rdev::Key::KeyQ),
        "R" | "r" => Some(rdev::Key::KeyR),
        "S" | "s" => Some(rdev::Key::KeyS),
        "T" | "t" => Some(rdev::Key::KeyT),
        "U" | "u" => Some(rdev::Key::KeyU),
        "V" | "v" => Some(rdev::Key::KeyV),
        "W" | "w" => Some(rdev::Key::KeyW),
        "X" | "x" => Some(rdev::Key::KeyX),
        "Y" | "y" => Some(rdev::Key::KeyY),
        "Z" | "z" => Some(rdev::Key::KeyZ),

        _ => None,
    }
}

/// Parse a mouse button name (`"Left"`, `"Right"`, `"Middle"`).
pub fn parse_button(key_str: &str) -> Option<rdev::Button> {
    match key_str {
        "Left" => Some(rdev::Button::Left),
        "Right" => Some(rdev::Button::Right),
        "Middle" => Some(rdev::Button::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toggle_keys() {
        assert_eq!(parse_key("CapsLock"), Some(rdev::Key::CapsLock));
        assert_eq!(parse_key("NumLock"), Some(rdev::Key::NumLock));
    }

    #[test]
    fn parses_mouse_buttons() {
        assert_eq!(parse_button("Left"), Some(rdev::Button::Left));
        assert_eq!(parse_button("Middle"), Some(rdev::Button::Middle));
        assert_eq!(parse_button("xyz"), None);
    }

    #[test]
    fn resolves_binding_by_kind() {
        let keyboard = ShortcutConfig {
            key: "F9".to_string(),
            kind: ShortcutKind::Keyboard,
            ..ShortcutConfig::default()
        };
        assert_eq!(parse_binding(&keyboard), Some(BoundKey::Key(rdev::Key::F9)));

        let mouse = ShortcutConfig {
            key: "Right".to_string(),
            kind: ShortcutKind::Mouse,
            ..ShortcutConfig::default()
        };
        assert_eq!(
            parse_binding(&mouse),
            Some(BoundKey::Button(rdev::Button::Right))
        );
    }
}
