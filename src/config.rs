//! Application-level configuration loading: round timing, catalog location and metadata policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GEO_QUIZ_CONFIG_PATH";
/// Environment variable that overrides the catalog path from the config file.
const CATALOG_PATH_ENV: &str = "GEO_QUIZ_CATALOG_PATH";
/// Default location of the round catalog.
const DEFAULT_CATALOG_PATH: &str = "config/rounds.json";
const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Countdown length of every round.
    pub round_duration: Duration,
    /// Period between two countdown ticks. Each tick consumes this much round time.
    pub tick_interval: Duration,
    /// Path of the JSON round catalog.
    pub catalog_path: PathBuf,
    /// Keep collected connection metadata after the connection drops.
    pub retain_metadata_on_disconnect: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        round_duration_secs = config.round_duration.as_secs(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(catalog_path) = env::var_os(CATALOG_PATH_ENV).filter(|p| !p.is_empty()) {
            config.catalog_path = PathBuf::from(catalog_path);
        }

        config
    }

    /// Parse a configuration document. Missing keys take their default value.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Whole seconds a round counts down from.
    pub fn round_seconds(&self) -> u32 {
        u32::try_from(self.round_duration.as_secs()).unwrap_or(u32::MAX)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            round_duration: DEFAULT_ROUND_DURATION,
            tick_interval: DEFAULT_TICK_INTERVAL,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            retain_metadata_on_disconnect: false,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    round_duration_secs: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    tick_interval_ms: Option<Duration>,
    #[serde(default)]
    catalog_path: Option<PathBuf>,
    #[serde(default)]
    retain_metadata_on_disconnect: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            round_duration: value
                .round_duration_secs
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.round_duration),
            tick_interval: value
                .tick_interval_ms
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.tick_interval),
            catalog_path: value.catalog_path.unwrap_or(defaults.catalog_path),
            retain_metadata_on_disconnect: value
                .retain_metadata_on_disconnect
                .unwrap_or(defaults.retain_metadata_on_disconnect),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.round_seconds(), 30);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_json_str(
            r#"{
                "roundDurationSecs": 5,
                "tickIntervalMs": 250,
                "catalogPath": "data/rounds.json",
                "retainMetadataOnDisconnect": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.round_duration, Duration::from_secs(5));
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.catalog_path, PathBuf::from("data/rounds.json"));
        assert!(config.retain_metadata_on_disconnect);
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let config =
            AppConfig::from_json_str(r#"{"roundDurationSecs": 0, "tickIntervalMs": 0}"#).unwrap();
        assert_eq!(config.round_duration, DEFAULT_ROUND_DURATION);
        assert_eq!(config.tick_interval, DEFAULT_TICK_INTERVAL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_json_str(r#"{"colors": []}"#).is_err());
    }
}
