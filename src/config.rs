//! Application configuration.
//!
//! Values come from an optional JSON file and are then overridden by
//! `BLUE_PODCAST_*` environment variables.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::controller::PlayerSettings;

const CONFIG_PATH_VAR: &str = "BLUE_PODCAST_CONFIG";
const DEFAULT_CONFIG_PATH: &str = ".config/blue-podcast.json";
const DEFAULT_API_BASE: &str = "https://listen-api.listennotes.com/api/v2";
const DEFAULT_LOG_DIR: &str = ".logs";
// Covers downloading a whole episode, which happens before it can play
const DEFAULT_READY_TIMEOUT_SECS: u64 = 60;
pub const USER_AGENT: &str = "Blue Podcast";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub log_dir: String,
    /// Time allowed from `request` to `Ready`. Streams are fully downloaded
    /// before decoding, so this bounds the download of a whole episode.
    pub ready_timeout_secs: u64,
    pub duck_volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            log_dir: DEFAULT_LOG_DIR.to_string(),
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
            duck_volume: PlayerSettings::default().duck_volume,
        }
    }
}

impl AppConfig {
    /// Load from the config file (if present) and the process environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = read_optional(Path::new(&path))?;
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        file_contents: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match file_contents {
            Some(contents) => serde_json::from_str::<Self>(contents).context("Invalid config file")?,
            None => Self::default(),
        };

        if let Some(base) = env("BLUE_PODCAST_API_BASE") {
            config.api_base_url = base;
        }
        if let Some(key) = env("BLUE_PODCAST_API_KEY") {
            config.api_key = Some(key);
        }
        if let Some(dir) = env("BLUE_PODCAST_LOG_DIR") {
            config.log_dir = dir;
        }
        if let Some(secs) = env("BLUE_PODCAST_READY_TIMEOUT_SECS") {
            config.ready_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("BLUE_PODCAST_READY_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        if let Some(volume) = env("BLUE_PODCAST_DUCK_VOLUME") {
            config.duck_volume = volume
                .trim()
                .parse()
                .with_context(|| format!("BLUE_PODCAST_DUCK_VOLUME is not a number: {volume}"))?;
        }

        config.duck_volume = config.duck_volume.clamp(0.0, 1.0);
        Ok(config)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            duck_volume: self.duck_volume,
            ..PlayerSettings::default()
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = AppConfig::from_sources(None, env(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ready_timeout(), Duration::from_secs(60));
        assert_eq!(config.player_settings(), PlayerSettings::default());
    }

    #[test]
    fn environment_overrides_file() {
        let file = r#"{"api_key": "from-file", "ready_timeout_secs": 5, "log_dir": "/tmp/logs"}"#;

        let config = AppConfig::from_sources(
            Some(file),
            env(&[
                ("BLUE_PODCAST_API_KEY", "from-env"),
                ("BLUE_PODCAST_DUCK_VOLUME", "0.25"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.ready_timeout_secs, 5);
        assert_eq!(config.log_dir, "/tmp/logs");
        assert_eq!(config.player_settings().duck_volume, 0.25);
    }

    #[test]
    fn duck_volume_is_clamped() {
        let config =
            AppConfig::from_sources(None, env(&[("BLUE_PODCAST_DUCK_VOLUME", "3")])).unwrap();

        assert_eq!(config.duck_volume, 1.0);
    }

    #[test]
    fn bad_numbers_are_errors() {
        let result =
            AppConfig::from_sources(None, env(&[("BLUE_PODCAST_READY_TIMEOUT_SECS", "soon")]));

        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::from_sources(Some("{not json"), env(&[])).is_err());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "http://localhost:8080"}"#).unwrap();

        let contents = read_optional(&path).unwrap();
        let config = AppConfig::from_sources(contents.as_deref(), env(&[])).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(read_optional(&dir.path().join("missing.json")).unwrap(), None);
    }
}
