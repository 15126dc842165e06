use std::path::Path;

use reqwest::Url;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Overrides `api.baseUrl`.
pub const ENV_API_BASE_URL: &str = "VIDINSIGHT_API_BASE_URL";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "VIDINSIGHT_LOG_LEVEL";

const MAX_PAGE_SIZE: u32 = 500;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: Config = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Applies environment variable overrides. Empty values are ignored.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(base_url) = env_value(ENV_API_BASE_URL) {
        log::debug!("Using API base URL from {}", ENV_API_BASE_URL);
        config.api.base_url = base_url;
    }
    if let Some(level) = env_value(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    match Url::parse(&config.api.base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        Ok(_) => {
            return Err(ConfigError::Validation {
                message: format!("api.baseUrl cannot be used as a base: {}", config.api.base_url),
            })
        }
        Err(e) => {
            return Err(ConfigError::Validation {
                message: format!("Invalid api.baseUrl '{}': {}", config.api.base_url, e),
            })
        }
    }

    let tracker = &config.tracker;
    if tracker.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "tracker.pollIntervalSecs must be positive".to_string(),
        });
    }
    if tracker.stale_after_secs <= tracker.poll_interval_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "tracker.staleAfterSecs ({}) must be greater than tracker.pollIntervalSecs ({})",
                tracker.stale_after_secs, tracker.poll_interval_secs
            ),
        });
    }
    if tracker.page_size == 0 || tracker.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation {
            message: format!(
                "tracker.pageSize must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, tracker.page_size
            ),
        });
    }

    let capture = &config.capture;
    if capture.poll_interval_ms == 0 || capture.max_wait_ms == 0 {
        return Err(ConfigError::Validation {
            message: "capture intervals must be positive".to_string(),
        });
    }
    if capture.poll_interval_ms > capture.max_wait_ms {
        return Err(ConfigError::Validation {
            message: format!(
                "capture.pollIntervalMs ({}) must not exceed capture.maxWaitMs ({})",
                capture.poll_interval_ms, capture.max_wait_ms
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config.tracker.poll_interval_secs, 12);
        assert_eq!(config.tracker.stale_after_secs, 300);
        assert_eq!(config.capture.poll_interval_ms, 400);
        assert_eq!(config.capture.max_wait_ms, 15_000);
        assert!(config.report.include_raw_data);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{"version": "2.0"}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_unknown_key_fails_schema() {
        let result = load_config_from_str(r#"{"version": "1.0", "workers": 4}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_wrong_type_fails_schema() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "tracker": {"pollIntervalSecs": "often"}}"#,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_stale_threshold_must_exceed_poll_interval() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "tracker": {"pollIntervalSecs": 30, "staleAfterSecs": 20}}"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_capture_poll_must_not_exceed_max_wait() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "capture": {"pollIntervalMs": 500, "maxWaitMs": 100}}"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ version: 1.0 ");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
