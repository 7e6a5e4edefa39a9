//! Configuration for the map panel.
//!
//! Loaded from `panel_config.json` with support for environment variable overrides.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use outbreak_schema::DiseaseFilter;

use crate::playback::playback_period;

pub const BUILTIN_PANEL_CONFIG: &str = include_str!("data/panel_config.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub playback: PlaybackConfig,
    pub refresh: RefreshConfig,
    pub default_disease: DiseaseFilter,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            refresh: RefreshConfig::default(),
            default_disease: DiseaseFilter::All,
        }
    }
}

/// Playback cadence: one step per `base_interval_ms` at 1x.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub base_interval_ms: u64,
    pub min_speed: f64,
    pub speed_presets: Vec<f64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 800,
            min_speed: 0.25,
            speed_presets: vec![0.5, 1.0, 2.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse panel config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read panel config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PanelConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_PANEL_CONFIG).expect("builtin panel config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = PanelConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.playback.base_interval_ms)
    }

    pub fn playback_period(&self, speed: f64) -> Duration {
        playback_period(self.base_interval(), speed, self.playback.min_speed)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs.max(1))
    }

    /// Nearest preset above (or below) `current`; stays put at either end.
    pub fn next_speed_preset(&self, current: f64, faster: bool) -> f64 {
        let presets = &self.playback.speed_presets;
        let candidate = if faster {
            presets
                .iter()
                .copied()
                .filter(|speed| *speed > current)
                .min_by(f64::total_cmp)
        } else {
            presets
                .iter()
                .copied()
                .filter(|speed| *speed < current)
                .max_by(f64::total_cmp)
        };
        candidate.unwrap_or(current)
    }
}

/// Load panel configuration from `OUTBREAK_PANEL_CONFIG_PATH` or the default path.
pub fn load_panel_config_from_env() -> (Arc<PanelConfig>, Option<PathBuf>) {
    let override_path = env::var("OUTBREAK_PANEL_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/panel_config.json");
    let path = override_path.unwrap_or(default_path);

    match PanelConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "outbreak::config",
                path = %path.display(),
                "panel_config.loaded=file"
            );
            return (Arc::new(config), Some(path));
        }
        Err(err) => {
            tracing::warn!(
                target: "outbreak::config",
                path = %path.display(),
                error = %err,
                "panel_config.load_failed"
            );
        }
    }

    let config = PanelConfig::builtin();
    tracing::info!(target: "outbreak::config", "panel_config.loaded=builtin");
    (config, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_schema::Disease;

    #[test]
    fn builtin_matches_defaults() {
        assert_eq!(*PanelConfig::builtin(), PanelConfig::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            PanelConfig::from_json_str(r#"{ "default_disease": "Cholera", "playback": { "base_interval_ms": 400 } }"#)
                .unwrap();
        assert_eq!(config.default_disease, DiseaseFilter::Only(Disease::Cholera));
        assert_eq!(config.playback.base_interval_ms, 400);
        assert_eq!(config.playback.min_speed, 0.25);
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
    }

    #[test]
    fn speed_presets_step_and_stop_at_ends() {
        let config = PanelConfig::default();
        assert_eq!(config.next_speed_preset(1.0, true), 2.0);
        assert_eq!(config.next_speed_preset(1.0, false), 0.5);
        assert_eq!(config.next_speed_preset(4.0, true), 4.0);
        assert_eq!(config.next_speed_preset(0.5, false), 0.5);
        assert_eq!(config.next_speed_preset(3.0, true), 4.0);
    }

    #[test]
    fn period_uses_base_interval_and_floor() {
        let config = PanelConfig::default();
        assert_eq!(config.playback_period(1.0), Duration::from_millis(800));
        assert_eq!(config.playback_period(4.0), Duration::from_millis(200));
        assert_eq!(config.playback_period(0.0), Duration::from_millis(3200));
    }
}
