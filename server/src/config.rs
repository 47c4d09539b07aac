//! Server configuration: TOML-backed, following the layout and
//! load/save conventions of the client's own `AppConfig`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    FunasrNano,
    Sensevoice,
    Paraformer,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::FunasrNano
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    pub model_type: ModelType,
    pub format_num: bool,
    pub format_spell: bool,
    pub log_level: String,
    /// Resolves design note §9's Open Question on the `overlap/2` merger
    /// cut boundary: exposed as a tunable fraction of `overlap`, default
    /// `0.5`.
    pub cut_fraction: f32,
    /// Number of ASR worker threads (spec §5: "multiple workers MAY be
    /// added but this spec assumes one").
    pub worker_count: usize,
    pub data_dir: Option<PathBuf>,
    pub punctuation_model: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 6016,
            model_type: ModelType::default(),
            format_num: true,
            format_spell: true,
            log_level: "info".to_string(),
            cut_fraction: 0.5,
            worker_count: 1,
            data_dir: None,
            punctuation_model: None,
        }
    }
}

impl ServerConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn load(paths: &ServerPaths) -> Result<Self, ConfigError> {
        if !paths.settings_file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&paths.settings_file)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, paths: &ServerPaths) -> Result<(), ConfigError> {
        self.save_to(&paths.settings_file)
    }

    pub fn data_dir(&self, paths: &ServerPaths) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| paths.data_dir.clone())
    }
}

/// Platform data directories, mirroring the client's `AppPaths`.
#[derive(Debug, Clone)]
pub struct ServerPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    pub data_dir: PathBuf,
}

impl ServerPaths {
    pub fn discover() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capswriter-server");
        Self {
            settings_file: config_dir.join("settings.toml"),
            data_dir: config_dir.join("data"),
            config_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_port() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 6016);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let config = ServerConfig {
            port: 7000,
            ..ServerConfig::default()
        };
        config.save_to(&path).unwrap();
        let loaded = ServerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.port, 7000);
    }

    #[test]
    fn load_falls_back_to_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ServerPaths {
            config_dir: dir.path().to_path_buf(),
            settings_file: dir.path().join("settings.toml"),
            data_dir: dir.path().join("data"),
        };
        let config = ServerConfig::load(&paths).unwrap();
        assert_eq!(config.port, ServerConfig::default().port);
    }
}
