//! Video settings persisted as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use emu_core::logging::{LogConfig, LogFilterError};
use emu_core::ppu::ShadeTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid log filter: {0}")]
    LogFilter(#[from] LogFilterError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Colours for palette entries 0-3
    #[serde(default)]
    pub shades: ShadeTable,
    /// Log filter such as `"timing=trace,frame=info"`
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Append log output to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Messages per category per second before dropping
    #[serde(default)]
    pub log_rate_limit: Option<usize>,
}

impl VideoConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Push the logging fields that are set into the global log
    /// configuration.
    pub fn apply_logging(&self) -> Result<(), ConfigError> {
        let logging = LogConfig::global();
        if let Some(filter) = &self.log_filter {
            logging.apply_filter(filter)?;
        }
        if let Some(limit) = self.log_rate_limit {
            logging.set_rate_limit(limit);
        }
        if let Some(path) = &self.log_file {
            logging.set_log_file(path.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::logging::{log, LogCategory, LogLevel};

    #[test]
    fn test_default_config() {
        let config = VideoConfig::default();
        assert_eq!(config.shades, ShadeTable::default());
        assert!(config.log_filter.is_none());
        assert!(config.log_file.is_none());
        assert!(config.log_rate_limit.is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = VideoConfig::from_json_str("{}").unwrap();
        assert_eq!(config, VideoConfig::default());

        let config = VideoConfig::from_json_str(r#"{"log_filter": "frame=info"}"#).unwrap();
        assert_eq!(config.log_filter.as_deref(), Some("frame=info"));
        assert_eq!(config.shades, ShadeTable::default());
    }

    #[test]
    fn test_custom_shades() {
        let json = r#"{"shades": [4292669627, 4287078535, 4281681988, 4279967261]}"#;
        let config = VideoConfig::from_json_str(json).unwrap();
        assert_eq!(config.shades.colors()[0], 0xFFDCF0BB);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            VideoConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir()
            .join(format!("emu_gb_video_config_{}.json", std::process::id()));
        let config = VideoConfig {
            shades: ShadeTable::new([1, 2, 3, 4]),
            log_filter: Some("sprites=debug".to_string()),
            log_file: Some(PathBuf::from("video.log")),
            log_rate_limit: Some(120),
        };
        config.save(&path).unwrap();
        let loaded = VideoConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("emu_gb_video_config_does_not_exist.json");
        assert!(matches!(VideoConfig::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bad_log_filter_is_reported() {
        let config = VideoConfig {
            log_filter: Some("nonsense=trace".to_string()),
            ..VideoConfig::default()
        };
        assert!(matches!(
            config.apply_logging(),
            Err(ConfigError::LogFilter(LogFilterError::UnknownCategory(_)))
        ));
    }

    #[test]
    fn test_log_file_receives_output() {
        let path = std::env::temp_dir()
            .join(format!("emu_gb_video_log_{}.log", std::process::id()));
        fs::remove_file(&path).ok();
        let config = VideoConfig {
            log_filter: Some("frame=info".to_string()),
            log_file: Some(path.clone()),
            log_rate_limit: Some(120),
            ..VideoConfig::default()
        };
        config.apply_logging().unwrap();
        assert_eq!(LogConfig::global().rate_limit(), 120);

        let marker = format!("log file check {}", std::process::id());
        log(LogCategory::Frame, LogLevel::Info, || marker.clone());

        // The writer thread appends asynchronously.
        let mut contents = String::new();
        for _ in 0..200 {
            contents = fs::read_to_string(&path).unwrap_or_default();
            if contents.contains(&marker) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        LogConfig::global().clear_log_file();
        fs::remove_file(&path).ok();
        assert!(contents.contains(&marker), "log file held {:?}", contents);
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let config = VideoConfig {
            log_file: Some(std::env::temp_dir().join("emu_gb_no_such_dir").join("video.log")),
            ..VideoConfig::default()
        };
        assert!(matches!(config.apply_logging(), Err(ConfigError::Io(_))));
    }
}
