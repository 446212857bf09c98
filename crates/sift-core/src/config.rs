//! Configuration management for sift.
//!
//! Loads configuration from ${SIFT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Timing knobs for the simulated turn.
///
/// All values are milliseconds. Zero is valid everywhere and degenerates to
/// immediate emission rather than an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Per-character cadence while streaming the thinking log.
    pub thinking_cadence_ms: u64,
    /// Per-character cadence while streaming the reply text.
    pub reply_cadence_ms: u64,
    /// Pause after the thinking stream before entering `speaking`.
    pub thinking_settle_ms: u64,
    /// Pause after the reply stream before entering `workflow_running`.
    pub reply_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            thinking_cadence_ms: 10,
            reply_cadence_ms: 30,
            thinking_settle_ms: 400,
            reply_settle_ms: 300,
        }
    }
}

impl TimingConfig {
    pub fn thinking_cadence(&self) -> Duration {
        Duration::from_millis(self.thinking_cadence_ms)
    }

    pub fn reply_cadence(&self) -> Duration {
        Duration::from_millis(self.reply_cadence_ms)
    }

    pub fn thinking_settle(&self) -> Duration {
        Duration::from_millis(self.thinking_settle_ms)
    }

    pub fn reply_settle(&self) -> Duration {
        Duration::from_millis(self.reply_settle_ms)
    }

    /// Instant-playback timings for tests and `--fast` runs.
    pub fn instant() -> Self {
        Self {
            thinking_cadence_ms: 0,
            reply_cadence_ms: 0,
            thinking_settle_ms: 0,
            reply_settle_ms: 0,
        }
    }
}

/// Viewport follow behavior knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Distance from the bottom (in lines) still considered "at bottom".
    pub bottom_threshold_lines: usize,
    /// How long the "new content" affordance lingers after a turn completes.
    pub affordance_grace_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            bottom_threshold_lines: 3,
            affordance_grace_ms: 1000,
        }
    }
}

impl ViewportConfig {
    pub fn affordance_grace(&self) -> Duration {
        Duration::from_millis(self.affordance_grace_ms)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Turn timing knobs.
    pub timing: TimingConfig,

    /// Viewport follow knobs.
    pub viewport: ViewportConfig,

    /// Log filter directive (overridden by SIFT_LOG env var).
    pub log_filter: Option<String>,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes a default config file if none exists yet.
    ///
    /// Returns true if a file was created.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(true)
    }
}

pub mod paths {
    //! Path resolution for sift configuration and data directories.
    //!
    //! SIFT_HOME resolution order:
    //! 1. SIFT_HOME environment variable (if set)
    //! 2. ~/.config/sift (default)

    use std::path::PathBuf;

    /// Returns the sift home directory.
    pub fn sift_home() -> PathBuf {
        if let Ok(home) = std::env::var("SIFT_HOME") {
            return PathBuf::from(home);
        }

        home_dir()
            .map(|h| h.join(".config").join("sift"))
            .expect("Could not determine home directory")
    }

    /// Returns the user's home directory.
    pub fn home_dir() -> Option<PathBuf> {
        std::env::var_os("HOME").map(PathBuf::from)
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        sift_home().join("config.toml")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        sift_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.timing.thinking_cadence_ms, 10);
        assert_eq!(config.viewport.bottom_threshold_lines, 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing]\nreply_cadence_ms = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timing.reply_cadence_ms, 5);
        assert_eq!(config.timing.thinking_cadence_ms, 10);
    }

    #[test]
    fn init_creates_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(Config::init_at(&path).unwrap());
        assert!(!Config::init_at(&path).unwrap());

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timing.reply_cadence_ms, 30);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timing = \"not a table\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
