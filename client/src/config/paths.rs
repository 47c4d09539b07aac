//! Cross-platform application paths using the `dirs` crate, mirroring
//! `voice-to-text`'s `config::paths::AppPaths`.
//!
//! Config dir (settings + hot-word files):
//!   Windows: %APPDATA%\capswriter\
//!   macOS:   ~/Library/Application Support/capswriter/
//!   Linux:   ~/.config/capswriter/

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    pub hot_zh_file: PathBuf,
    pub hot_en_file: PathBuf,
    pub hot_rule_file: PathBuf,
    pub keywords_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "capswriter";

    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            hot_zh_file: config_dir.join("hot-zh.txt"),
            hot_en_file: config_dir.join("hot-en.txt"),
            hot_rule_file: config_dir.join("hot-rule.txt"),
            keywords_file: config_dir.join("keywords.txt"),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .keywords_file
            .file_name()
            .is_some_and(|n| n == "keywords.txt"));
    }
}
