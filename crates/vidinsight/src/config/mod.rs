pub mod loader;
pub mod schema;

pub use loader::{
    apply_env_overrides, load_config, load_config_from_str, validate_config, ENV_API_BASE_URL,
    ENV_LOG_LEVEL,
};
pub use schema::{
    ApiConfig, CaptureConfig, Config, LogFormat, LoggingConfig, ReportConfig, TrackerConfig,
    CONFIG_VERSION,
};
