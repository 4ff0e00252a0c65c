//! Configuration parsing and validation for wardend
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Timer parameters (house count, durations, alert thresholds)
//! - Optional house labels and an optional overtime ceiling
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

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
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<TimerPolicy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<TimerPolicy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(TimerPolicy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = "config_version = 1";

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.total_houses, 12);
        assert_eq!(policy.initial_duration_seconds, 2100);
        assert_eq!(policy.preview_alert_seconds, 10);
        assert_eq!(policy.overtime_alert_offsets, vec![5, 10]);
        assert!(policy.negative_ceiling_seconds.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [timers]
            total_houses = 3
            initial_duration_seconds = 120
            preview_alert_seconds = 15
            overtime_alert_offsets = [3, 8]
            negative_ceiling_seconds = 600
            labels = ["North", "South"]

            [daemon]
            data_dir = "/tmp/wardend"
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.total_houses, 3);
        assert_eq!(policy.initial_duration_seconds, 120);
        assert_eq!(policy.preview_alert_seconds, 15);
        assert_eq!(policy.overtime_alert_offsets, vec![3, 8]);
        assert_eq!(policy.negative_ceiling_seconds, Some(600));
        // Labels are padded out to the house count
        assert_eq!(policy.house_label(0), "North");
        assert_eq!(policy.house_label(2), "House 2");
    }

    #[test]
    fn reject_wrong_version() {
        let config = "config_version = 99";

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }
}
