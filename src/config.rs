//! Service configuration.
//!
//! Loaded from a TOML file. The binary picks the path: `--config`, else
//! `OCEANMON_CONFIG` (a `.env` file is honoured), else `oceanmon.toml`.
//! Every field has a default, so an empty or missing file yields a working
//! configuration; a malformed file is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::alert::thresholds::AlertMode;

pub const CONFIG_ENV_VAR: &str = "OCEANMON_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "oceanmon.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub monitor: PollingConfig,
    pub alerts: AlertConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between fetch cycles.
    pub poll_interval_secs: u64,
    /// Seconds between dashboard clock ticks.
    pub clock_interval_secs: u64,
    /// How long a single-cycle run waits for outstanding sources.
    pub cycle_timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 600,
            clock_interval_secs: 1,
            cycle_timeout_secs: 60,
        }
    }
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_secs(self.clock_interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub mode: AlertMode,
    /// Chance per recomputation of appending the "system check" filler entry.
    pub system_check_probability: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            mode: AlertMode::Level,
            system_check_probability: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub marine_base_url: String,
    pub forecast_base_url: String,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            marine_base_url: crate::ingest::open_meteo::MARINE_BASE_URL.to_string(),
            forecast_base_url: crate::ingest::open_meteo::FORECAST_BASE_URL.to_string(),
            user_agent: concat!("oceanmon_service/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> reqwest::Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone())
            .build()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MonitorConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("monitor.poll_interval_secs must be > 0".into()));
        }
        if self.monitor.clock_interval_secs == 0 {
            return Err(ConfigError::Invalid("monitor.clock_interval_secs must be > 0".into()));
        }
        let p = self.alerts.system_check_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "alerts.system_check_probability must be within [0, 1], got {}",
                p
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MonitorConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config.monitor.poll_interval_secs, 600);
        assert_eq!(config.alerts.mode, AlertMode::Level);
        assert_eq!(config.alerts.system_check_probability, 0.05);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let raw = r#"
            [alerts]
            mode = "edge"

            [monitor]
            poll_interval_secs = 120
        "#;
        let config = MonitorConfig::from_toml_str(raw).expect("valid config");
        assert_eq!(config.alerts.mode, AlertMode::Edge);
        assert_eq!(config.alerts.system_check_probability, 0.05);
        assert_eq!(config.monitor.poll_interval_secs, 120);
        assert_eq!(config.monitor.clock_interval_secs, 1);
    }

    #[test]
    fn test_out_of_range_probability_is_rejected() {
        let raw = "[alerts]\nsystem_check_probability = 1.5\n";
        let err = MonitorConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {:?}", err);
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let raw = "[monitor]\npoll_interval_secs = 0\n";
        assert!(MonitorConfig::from_toml_str(raw).is_err());
    }

    #[test]
    fn test_unknown_alert_mode_is_a_parse_error() {
        let raw = "[alerts]\nmode = \"sometimes\"\n";
        let err = MonitorConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[logging]\nlevel = \"debug\"\nconsole_timestamps = false").unwrap();
        let config = MonitorConfig::load(file.path()).expect("config loads");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.console_timestamps);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = MonitorConfig::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config.http.timeout_secs, 15);
    }
}
