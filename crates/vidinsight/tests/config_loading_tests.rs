//! Table-driven tests for configuration loading and validation.

mod common;

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use vidinsight::config::{
    load_config, load_config_from_str, LogFormat, ENV_API_BASE_URL, ENV_LOG_LEVEL,
};
use vidinsight::client::SortOrder;
use vidinsight::error::ConfigError;

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "api": {
                "baseUrl": "https://analytics.example.com/api",
                "connectTimeoutSecs": 5,
                "requestTimeoutSecs": 20
            },
            "tracker": {
                "pollIntervalSecs": 10,
                "staleAfterSecs": 600,
                "pageSize": 100,
                "sortBy": "updatedAt",
                "sortOrder": "asc",
                "eventCapacity": 32
            },
            "capture": { "pollIntervalMs": 300, "maxWaitMs": 10000 },
            "report": {
                "title": "Weekly Review",
                "includeRawData": false,
                "chartWidth": 800,
                "chartHeight": 500
            },
            "logging": { "level": "debug", "format": "json" }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_version",
        config_json: r#"{ "tracker": {} }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "9.9" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "unknown_section",
        config_json: r#"{ "version": "1.0", "database": {} }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "page_size_too_large",
        config_json: r#"{ "version": "1.0", "tracker": { "pageSize": 1000 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "zero_poll_interval",
        config_json: r#"{ "version": "1.0", "tracker": { "pollIntervalSecs": 0 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "stale_below_poll_interval",
        config_json: r#"{ "version": "1.0", "tracker": { "pollIntervalSecs": 60, "staleAfterSecs": 30 } }"#,
        should_succeed: false,
        expected_error: Some("staleAfterSecs"),
    },
    ConfigTestCase {
        name: "relative_base_url",
        config_json: r#"{ "version": "1.0", "api": { "baseUrl": "analytics/api" } }"#,
        should_succeed: false,
        expected_error: Some("Invalid api.baseUrl"),
    },
    ConfigTestCase {
        name: "unknown_log_format",
        config_json: r#"{ "version": "1.0", "logging": { "format": "xml" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
];

#[test]
#[serial]
fn test_json_config_table() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    assert!(
                        e.to_string().contains(expected),
                        "{}: '{}' does not contain '{}'",
                        case.name,
                        e,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
#[serial]
fn test_full_config_values() {
    let config = load_config_from_str(JSON_CONFIG_TESTS[1].config_json).unwrap();

    assert_eq!(config.api.base_url, "https://analytics.example.com/api");
    assert_eq!(config.tracker.page_size, 100);
    assert_eq!(config.tracker.sort_order, SortOrder::Asc);
    assert_eq!(config.capture.max_wait_ms, 10_000);
    assert!(!config.report.include_raw_data);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "version": "1.0", "report": {{ "title": "From disk" }} }}"#).unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.report.title, "From disk");
}

#[test]
fn test_missing_file_reports_path() {
    let result = load_config("/nonexistent/vidinsight.json");
    match result {
        Err(ConfigError::ReadFile { path, .. }) => {
            assert!(path.ends_with("vidinsight.json"));
        }
        other => panic!("expected ReadFile error, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[serial]
fn test_env_overrides_win() {
    std::env::set_var(ENV_API_BASE_URL, "https://override.example.com/api");
    std::env::set_var(ENV_LOG_LEVEL, "trace");

    let config = load_config_from_str(r#"{ "version": "1.0" }"#);

    std::env::remove_var(ENV_API_BASE_URL);
    std::env::remove_var(ENV_LOG_LEVEL);

    let config = config.unwrap();
    assert_eq!(config.api.base_url, "https://override.example.com/api");
    assert_eq!(config.logging.level, "trace");
}

#[test]
#[serial]
fn test_invalid_env_base_url_is_rejected() {
    std::env::set_var(ENV_API_BASE_URL, "not a url");
    let result = load_config_from_str(r#"{ "version": "1.0" }"#);
    std::env::remove_var(ENV_API_BASE_URL);

    assert!(matches!(result, Err(ConfigError::Validation { .. })));
}
