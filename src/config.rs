//! Configuration loading and management

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Update cadence to request of the activity source, milliseconds
    pub interval_hint_ms: u64,

    /// Confidence gate applied to incoming samples, 0-100
    pub min_confidence: u8,

    /// Begin tracking immediately at daemon launch
    pub start_on_launch: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("modality-tracker");

        let socket_path = data_dir.join("daemon.sock");

        let interval_hint_ms = env_parse("MODALITY_INTERVAL_MS", 10_000)?;
        let min_confidence = env_parse("MODALITY_MIN_CONFIDENCE", 75)?;
        let start_on_launch = env_parse("MODALITY_START_ON_LAUNCH", true)?;

        Ok(Self {
            socket_path,
            data_dir,
            interval_hint_ms,
            min_confidence,
            start_on_launch,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Read an environment variable, falling back to a default when unset
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid value for {name}: {value:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load().unwrap();
        assert!(config
            .socket_path
            .to_string_lossy()
            .contains("modality-tracker"));
        assert!(config.min_confidence <= 100);
    }
}
