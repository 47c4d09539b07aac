//! Application settings structs, defaults and TOML persistence (spec §6
//! "Configuration (client)"), following `voice-to-text`'s
//! `config/settings.rs` layout and round-trip test style almost verbatim.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// A single hotkey binding (spec §3 `Shortcut`).
///
/// Invariant: a shortcut with `restore = true` must name a stateful key
/// (CapsLock, NumLock, ScrollLock, or a modifier) — enforced by
/// [`ShortcutConfig::is_toggle_key`] rather than at the type level, since
/// the key set is open-ended text configured by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ShortcutKind,
    pub suppress: bool,
    pub restore: bool,
    pub hold_mode: bool,
    /// Seconds; `None` falls back to the top-level `threshold`.
    pub threshold: Option<f32>,
    pub enabled: bool,
}

impl ShortcutConfig {
    pub fn is_toggle_key(&self) -> bool {
        matches!(
            self.key.as_str(),
            "CapsLock" | "NumLock" | "ScrollLock" | "Shift" | "Control" | "Alt" | "Meta"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutKind {
    Keyboard,
    Mouse,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            key: "CapsLock".to_string(),
            kind: ShortcutKind::Keyboard,
            suppress: true,
            restore: true,
            hold_mode: true,
            threshold: None,
            enabled: true,
        }
    }
}

/// Top-level client configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub addr: String,
    pub port: u16,
    pub shortcuts: Vec<ShortcutConfig>,
    /// Default press-duration threshold (seconds) below which a press is
    /// cancelled rather than recognised (spec §4.5).
    pub threshold: f32,
    /// Inject via clipboard-paste rather than typed-character emulation.
    pub paste: bool,
    pub restore_clip: bool,
    pub save_audio: bool,
    pub audio_name_len: usize,
    /// Characters trimmed from the tail of the final transcript (spec §4.6).
    pub trash_punc: String,
    pub hot_zh: bool,
    pub hot_en: bool,
    pub hot_rule: bool,
    pub mic_seg_duration: f64,
    pub mic_seg_overlap: f64,
    pub file_seg_duration: f64,
    pub file_seg_overlap: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 6016,
            shortcuts: vec![ShortcutConfig::default()],
            threshold: 0.3,
            paste: false,
            restore_clip: true,
            save_audio: false,
            audio_name_len: 12,
            trash_punc: "，。,.".to_string(),
            hot_zh: true,
            hot_en: true,
            hot_rule: true,
            mic_seg_duration: 15.0,
            mic_seg_overlap: 2.0,
            file_seg_duration: 15.0,
            file_seg_overlap: 2.0,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");
        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values_match_spec() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.port, 6016);
        assert_eq!(cfg.threshold, 0.3);
        assert_eq!(cfg.trash_punc, "，。,.");
        assert_eq!(cfg.mic_seg_duration, 15.0);
        assert_eq!(cfg.mic_seg_overlap, 2.0);
        assert!(cfg.shortcuts[0].hold_mode);
    }

    #[test]
    fn caps_lock_is_a_toggle_key() {
        let shortcut = ShortcutConfig::default();
        assert!(shortcut.is_toggle_key());
        let other = ShortcutConfig {
            key: "F9".to_string(),
            ..ShortcutConfig::default()
        };
        assert!(!other.is_toggle_key());
    }
}
