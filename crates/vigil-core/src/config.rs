//! Runtime configuration: capacities, cadences, and room metadata.
//!
//! Distinct from user [`crate::domain::Settings`]: this file is
//! developer-authored, loaded once at startup, and never rewritten by the
//! pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOG_CAPACITY: usize = 100;
pub const DEFAULT_TREND_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Error)]
#[error("invalid runtime config: {0}")]
pub struct ConfigError(#[from] config::ConfigError);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum retained log entries; oldest evicted first.
    pub log_capacity: usize,
    /// Trend sampling period in milliseconds.
    pub trend_interval_ms: u64,
    pub room_id: String,
    pub expected_occupancy: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            trend_interval_ms: DEFAULT_TREND_INTERVAL_MS,
            room_id: "room-1".to_string(),
            expected_occupancy: "1 resident".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load from `path`, falling back to defaults field by field.
    ///
    /// A missing file means defaults; a malformed file is a startup
    /// error, unlike the durable records (which degrade instead, since
    /// they are machine-written).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .build()?;
        let loaded: RuntimeConfig = cfg.try_deserialize()?;
        Ok(loaded.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.log_capacity == 0 {
            self.log_capacity = DEFAULT_LOG_CAPACITY;
        }
        if self.trend_interval_ms == 0 {
            self.trend_interval_ms = DEFAULT_TREND_INTERVAL_MS;
        }
        self
    }

    /// TOML rendering of the defaults, written next to the store on first
    /// run so the knobs are discoverable.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&RuntimeConfig::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RuntimeConfig::load(&dir.path().join("vigil.toml")).unwrap();
        assert_eq!(cfg.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(cfg.trend_interval_ms, DEFAULT_TREND_INTERVAL_MS);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_capacity = 10\nroom_id = \"suite-3\"").unwrap();
        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.log_capacity, 10);
        assert_eq!(cfg.room_id, "suite-3");
        assert_eq!(cfg.trend_interval_ms, DEFAULT_TREND_INTERVAL_MS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "log_capacity = [not toml").unwrap();
        assert!(RuntimeConfig::load(&path).is_err());
    }

    #[test]
    fn zero_knobs_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "log_capacity = 0\ntrend_interval_ms = 0").unwrap();
        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(cfg.trend_interval_ms, DEFAULT_TREND_INTERVAL_MS);
    }

    #[test]
    fn default_toml_round_trips() {
        let text = RuntimeConfig::default_toml();
        let parsed: RuntimeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.log_capacity, DEFAULT_LOG_CAPACITY);
    }
}
