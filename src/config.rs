use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::widget::Pacing;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub open_delay_ms: Option<u64>,
    pub intro_gap_ms: Option<u64>,
    pub reply_delay_ms: Option<u64>,
    pub tick_ms: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    #[cfg(test)]
    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Presentation delays, defaults unless overridden in the file.
    pub fn pacing(&self) -> Pacing {
        let defaults = Pacing::default();
        Pacing {
            open_delay: self
                .open_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.open_delay),
            intro_gap: self
                .intro_gap_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.intro_gap),
            reply_delay: self
                .reply_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reply_delay),
            tick: self
                .tick_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
        }
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("studio-chat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.backend_url.is_none());
        assert_eq!(config.pacing().open_delay, Duration::from_millis(300));
        assert_eq!(config.pacing().intro_gap, Duration::from_millis(500));
        assert_eq!(config.pacing().reply_delay, Duration::from_millis(500));
        assert_eq!(config.pacing().tick, Duration::from_millis(300));
    }

    #[test]
    fn round_trips_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            backend_url: Some("http://localhost:5000".to_string()),
            log_file: Some(PathBuf::from("/tmp/studio-chat.log")),
            reply_delay_ms: Some(50),
            tick_ms: Some(100),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(loaded.log_file, config.log_file);
        assert_eq!(loaded.pacing().reply_delay, Duration::from_millis(50));
        assert_eq!(loaded.pacing().tick, Duration::from_millis(100));
        // Unset delays keep their defaults
        assert_eq!(loaded.pacing().open_delay, Duration::from_millis(300));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
