pub mod analytics;
pub mod charts;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod tracker;

pub use analytics::{AnalyticsRecord, GeneratedSummary, MetricValue};
pub use charts::{expand_variants, normalize, ChartSeries, ChartSpec, ChartStatus, PlotType, RawChart};
pub use client::{AnalyticsClient, ClientError, HttpAnalyticsClient};
pub use config::{load_config, Config};
pub use error::{AssemblyError, CaptureError, ConfigError, Result, SubmissionError, VidinsightError};
pub use logging::init_logging;
pub use report::{
    assemble_document, render_pdf, report_filename, ChartCapturer, ChartSurface, Document,
    ReportArtifact, ReportAssembler, StaticChartSurface,
};
pub use tracker::{JobStatus, ProcessingJob, QueueEvent, QueueTracker, SubmitRequest};
