//! # App Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FLEET_DB_PATH=/tmp/fleet.db                                        │
//! │     FLEET_UTC_OFFSET_MINUTES=480                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fleet-driver/config.toml (Linux)                         │
//! │     ~/Library/Application Support/com.fleet.fleet-driver/config.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! database_path = "/var/lib/fleet/fleet.db"
//! session_path = "/var/lib/fleet/session.json"
//! utc_offset_minutes = 480
//! history_limit = 20
//!
//! [cdn]
//! host = "res.cloudinary.com"
//! cloud_name = "fleet"
//! ```

use directories::ProjectDirs;
use fleet_core::media::CdnConfig;
use fleet_core::{EarningsCalculator, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite document store file.
    pub database_path: PathBuf,

    /// Local session flags (JSON).
    pub session_path: PathBuf,

    /// Offset used for peak-hour, weekend and calendar-day classification.
    /// Default: 0 (UTC)
    pub utc_offset_minutes: i32,

    /// Media CDN used to render terminal QR images.
    pub cdn: CdnConfig,

    /// Completed trips shown in history.
    pub history_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        AppConfig {
            database_path: data_dir.join("fleet.db"),
            session_path: data_dir.join("session.json"),
            utc_offset_minutes: 0,
            cdn: CdnConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl AppConfig {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::internal(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| AppError::validation(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Checks values that would otherwise fail later.
    pub fn validate(&self) -> AppResult<()> {
        if EarningsCalculator::from_offset_minutes(self.utc_offset_minutes).is_none() {
            return Err(AppError::validation(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        if self.history_limit == 0 {
            return Err(AppError::validation("history_limit must be at least 1"));
        }
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FLEET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("FLEET_SESSION_PATH") {
            self.session_path = PathBuf::from(path);
        }

        if let Ok(offset) = std::env::var("FLEET_UTC_OFFSET_MINUTES") {
            match offset.parse::<i32>() {
                Ok(minutes) => self.utc_offset_minutes = minutes,
                Err(_) => warn!(value = %offset, "Ignoring invalid FLEET_UTC_OFFSET_MINUTES"),
            }
        }

        if let Ok(host) = std::env::var("FLEET_CDN_HOST") {
            self.cdn.host = host;
        }

        if let Ok(cloud) = std::env::var("FLEET_CDN_CLOUD_NAME") {
            self.cdn.cloud_name = cloud;
        }

        if let Ok(limit) = std::env::var("FLEET_HISTORY_LIMIT") {
            if let Ok(n) = limit.parse::<u32>() {
                self.history_limit = n;
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "fleet", "fleet-driver")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The earnings calculator for the configured offset.
    pub fn calculator(&self) -> EarningsCalculator {
        EarningsCalculator::from_offset_minutes(self.utc_offset_minutes)
            .unwrap_or_else(EarningsCalculator::utc)
    }
}

/// Platform data directory, or the working directory if none is known.
///
/// - **macOS**: `~/Library/Application Support/com.fleet.fleet-driver`
/// - **Linux**: `~/.local/share/fleet-driver`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "fleet", "fleet-driver")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.database_path.ends_with("fleet.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            utc_offset_minutes = 480

            [cdn]
            cloud_name = "acme"
            "#,
        )
        .unwrap();

        assert_eq!(config.utc_offset_minutes, 480);
        assert_eq!(config.cdn.cloud_name, "acme");
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "history_limit = 5\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.history_limit, 5);
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let config = AppConfig {
            utc_offset_minutes: 24 * 60,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_calculator_offset() {
        let config = AppConfig {
            utc_offset_minutes: 480,
            ..AppConfig::default()
        };
        assert_eq!(config.calculator().offset().local_minus_utc(), 480 * 60);
    }
}
