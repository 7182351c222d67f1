#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for the ratchet core
//!
//! Covers exactly the core-relevant surface: worker pool size, scan
//! timeout, the coarse auto-update filter, and the confirmation/whitelist
//! toggles. CLI flags, HTTP request bodies, and credential storage are the
//! excluded outer layers' concern.

use ratchet_errors::{ConfigError, Error};
use ratchet_types::AutoUpdateLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

fn default_max_concurrency() -> usize {
    5
}

fn default_scan_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// The core-relevant configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool size per scan and per parallelizable update group.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-scan wall-clock timeout.
    #[serde(default = "default_scan_timeout", with = "duration_secs")]
    pub scan_timeout: Duration,

    /// Coarse filter overlaid on the policy evaluator's own decision.
    #[serde(default)]
    pub auto_update_level: AutoUpdateLevel,

    /// Forces `require_approval` when no policy matched a candidate update.
    #[serde(default)]
    pub require_confirmation: bool,

    /// When true, packages with no matching `allow` policy are blocked
    /// rather than allowed by default.
    #[serde(default)]
    pub whitelist_enabled: bool,

    /// Gates the integrity-check path (hash comparisons handed in by adapters).
    #[serde(default)]
    pub verify_checksums: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            scan_timeout: default_scan_timeout(),
            auto_update_level: AutoUpdateLevel::None,
            require_confirmation: false,
            whitelist_enabled: false,
            verify_checksums: true,
        }
    }
}

impl Config {
    /// `~/.config/ratchet/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let home_dir = dirs::home_dir().ok_or_else(|| ConfigError::NotFound {
            path: "home directory".to_string(),
        })?;
        Ok(home_dir.join(".config").join("ratchet").join("config.toml"))
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is provided but cannot be read or parsed.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::load_from_file(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Merge environment variable overrides (`RATCHET_MAX_CONCURRENCY`,
    /// `RATCHET_SCAN_TIMEOUT_SECS`, `RATCHET_AUTO_UPDATE_LEVEL`,
    /// `RATCHET_REQUIRE_CONFIRMATION`, `RATCHET_WHITELIST_ENABLED`).
    ///
    /// # Errors
    ///
    /// Returns an error if a set environment variable cannot be parsed into
    /// its expected type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(v) = std::env::var("RATCHET_MAX_CONCURRENCY") {
            self.max_concurrency = v.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RATCHET_MAX_CONCURRENCY".to_string(),
                value: v,
            })?;
        }
        if let Ok(v) = std::env::var("RATCHET_SCAN_TIMEOUT_SECS") {
            let secs: u64 = v.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RATCHET_SCAN_TIMEOUT_SECS".to_string(),
                value: v,
            })?;
            self.scan_timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("RATCHET_AUTO_UPDATE_LEVEL") {
            self.auto_update_level = match v.as_str() {
                "none" => AutoUpdateLevel::None,
                "security" => AutoUpdateLevel::Security,
                "minor" => AutoUpdateLevel::Minor,
                "major" => AutoUpdateLevel::Major,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "RATCHET_AUTO_UPDATE_LEVEL".to_string(),
                        value: v,
                    }
                    .into())
                }
            };
        }
        if let Ok(v) = std::env::var("RATCHET_REQUIRE_CONFIRMATION") {
            self.require_confirmation = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("RATCHET_WHITELIST_ENABLED") {
            self.whitelist_enabled = matches!(v.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Reject non-sensical values before they reach the scan engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_concurrency` is zero or `scan_timeout` is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrency".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.scan_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "scan_timeout".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Save configuration to a specific path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the filesystem write fails.
    pub async fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError {
                    path: parent.display().to_string(),
                    error: e.to_string(),
                })?;
        }
        let toml_string = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        fs::write(path, toml_string)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }
}

/// Resolve an effective worker-pool size: an explicit override wins,
/// otherwise the config default, with 0 meaning "auto-detect from CPU count".
#[must_use]
pub fn effective_max_concurrency(config_value: usize, override_value: Option<u32>) -> usize {
    if let Some(v) = override_value {
        return v as usize;
    }
    if config_value > 0 {
        config_value
    } else {
        num_cpus::get().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let mut cfg = Config::default();
        cfg.max_concurrency = 0;
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.max_concurrency = 8;
        cfg.whitelist_enabled = true;
        cfg.save_to(&path).await.unwrap();

        let loaded = Config::load_from_file(&path).await.unwrap();
        assert_eq!(loaded.max_concurrency, 8);
        assert!(loaded.whitelist_enabled);
    }

    #[test]
    fn effective_concurrency_prefers_override() {
        assert_eq!(effective_max_concurrency(5, Some(2)), 2);
        assert_eq!(effective_max_concurrency(5, None), 5);
    }
}
