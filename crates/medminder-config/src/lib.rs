//! Configuration parsing and validation for medminderd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Service settings (paths, poll interval, sound and haptics)
//! - An optional seed list of medicines for first start
//! - Validation that reports every problem at once

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like `load_config`, but a missing file yields the defaults
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    // Validate
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert_eq!(config.service.poll_interval, Duration::from_secs(60));
        assert!(config.service.sound_enabled);
        assert!(!config.service.respect_date_range);
        assert!(config.seed_medicines.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            socket_path = "/tmp/mm-test/medminder.sock"
            data_dir = "/tmp/mm-test/data"
            poll_interval_seconds = 30
            sound_enabled = false
            respect_date_range = true

            [[medicines]]
            name = "Metformin"
            dosage = "500mg"
            frequency = "twice_daily"
            times = ["08:00", "20:00"]
            start_date = "2025-01-01"

            [[medicines]]
            name = "Ibuprofen"
            dosage = "200mg"
            frequency = "as_needed"
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.service.poll_interval, Duration::from_secs(30));
        assert!(!config.service.sound_enabled);
        assert!(config.service.respect_date_range);
        assert_eq!(
            config.service.socket_path.to_str(),
            Some("/tmp/mm-test/medminder.sock")
        );
        assert_eq!(config.seed_medicines.len(), 2);
        assert_eq!(config.seed_medicines[0].times, vec!["08:00", "20:00"]);
        assert!(config.seed_medicines[1].start_date.is_none());
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(config.seed_medicines.is_empty());
        assert_eq!(config.service.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[service]\nsound_enabled = false\n").unwrap();

        let config = load_config_or_default(&path).unwrap();
        assert!(!config.service.sound_enabled);
    }
}
