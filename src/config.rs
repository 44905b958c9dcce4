// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "TREND_PULSE_CONFIG";
const DEFAULT_PATH: &str = "config/pulse.toml";

/// Service configuration. Every field has a default so a missing file or
/// a partial one still yields a runnable setup.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PulseConfig {
    /// Polling cadence.
    pub interval_secs: u64,
    /// Rolling history capacity (samples).
    pub history_cap: usize,
    /// Organic result size when nothing is watched.
    pub default_trend_count: usize,
    /// Generative model identifier.
    pub model: String,
    /// HTTP listen port.
    pub port: u16,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            history_cap: 10,
            default_trend_count: 5,
            model: "gemini-2.5-flash".to_string(),
            port: 8000,
        }
    }
}

impl PulseConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $TREND_PULSE_CONFIG (must exist if set)
    /// 2) config/pulse.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to a non-existent path"));
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let cfg: PulseConfig = toml::from_str("interval_secs = 30").unwrap();
        assert_eq!(cfg.interval_secs, 30);
        assert_eq!(cfg.history_cap, 10);
        assert_eq!(cfg.model, "gemini-2.5-flash");
    }

    #[test]
    fn garbage_file_is_an_error_with_path_context() {
        let dir = env::temp_dir().join("trend-pulse-cfg-test");
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("broken.toml");
        fs::write(&p, "interval_secs = \"sixty\"").unwrap();
        let err = PulseConfig::load_from(&p).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[serial_test::serial]
    #[test]
    fn env_path_must_exist_when_set() {
        env::set_var(ENV_PATH, "/definitely/not/here.toml");
        assert!(PulseConfig::load_default().is_err());
        env::remove_var(ENV_PATH);
    }
}
