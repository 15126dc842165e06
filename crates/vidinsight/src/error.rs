use std::path::PathBuf;
use thiserror::Error;

pub use crate::client::ClientError;

#[derive(Error, Debug)]
pub enum VidinsightError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analytics API error: {0}")]
    Client(#[from] ClientError),

    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Report export failed: {0}")]
    Assembly(#[from] AssemblyError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// A processing request was rejected before a job could be tracked.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Server response did not include a job id")]
    MissingJobId,

    #[error("Job '{0}' is already being tracked")]
    DuplicateJob(String),

    #[error("Submission request failed: {0}")]
    Request(#[from] ClientError),
}

/// A single chart could not be captured. Always contained by the capturer.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Chart '{chart_id}' produced no visual content after {waited_ms} ms")]
    NotReady { chart_id: String, waited_ms: u64 },

    #[error("Failed to rasterize chart '{chart_id}': {reason}")]
    Rasterize { chart_id: String, reason: String },

    #[error("Failed to encode chart '{chart_id}' as PNG: {reason}")]
    Encode { chart_id: String, reason: String },
}

/// The report document itself could not be produced.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Failed to render report document: {0}")]
    Render(String),

    #[error("Failed to serialize report data: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VidinsightError>;
