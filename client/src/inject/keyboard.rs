//! Keyboard simulation backed by `enigo`: the system paste shortcut for
//! clipboard-mode injection, and direct character typing for the default
//! typed-character emulation mode (spec §4.6).

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::InjectError;

fn new_enigo() -> Result<Enigo, InjectError> {
    Enigo::new(&Settings::default()).map_err(|e| InjectError::KeySimulation(e.to_string()))
}

/// Simulate the system paste shortcut in the currently focused window.
///
/// * **macOS** -> Meta (Cmd) + V
/// * **Windows / Linux** -> Ctrl + V
pub fn simulate_paste() -> Result<(), InjectError> {
    let mut enigo = new_enigo()?;

    #[cfg(target_os = "macos")]
    let modifier = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    let modifier = Key::Control;

    enigo
        .key(modifier, Direction::Press)
        .map_err(|e| InjectError::KeySimulation(e.to_string()))?;
    enigo
        .key(Key::Unicode('v'), Direction::Click)
        .map_err(|e| InjectError::KeySimulation(e.to_string()))?;
    enigo
        .key(modifier, Direction::Release)
        .map_err(|e| InjectError::KeySimulation(e.to_string()))?;

    Ok(())
}

/// Type `text` directly as a sequence of character key events, with no
/// clipboard involved. This is the default injection mode (spec §4.6):
/// it works everywhere but is slower and, unlike paste, is visible to
/// the target application one character at a time.
pub fn type_text(text: &str) -> Result<(), InjectError> {
    let mut enigo = new_enigo()?;
    enigo
        .text(text)
        .map_err(|e| InjectError::KeySimulation(e.to_string()))
}
