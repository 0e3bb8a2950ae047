use anyhow::{Context, Result};
use confidence_guard::GuardConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub guard: GuardConfig,
    /// Drone addressed when a command names none
    #[serde(default)]
    pub default_drone_id: Option<String>,
}

impl Config {
    /// Load from `path`, writing the defaults there if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing config {}", path.display()))
        } else {
            let config = Self::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dronectl.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dronectl.json");
        let mut config = Config::default();
        config.guard.confidence_threshold = 0.6;
        config.default_drone_id = Some("drone-07".to_string());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dronectl.json");
        fs::write(&path, r#"{"guard": {"max_suggestions": 2}}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.guard.max_suggestions, 2);
        assert_eq!(config.guard.confidence_threshold, 0.7);
        assert_eq!(config.default_drone_id, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dronectl.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
