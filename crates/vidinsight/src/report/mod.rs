//! Report Assembler: chart capture, document assembly and PDF export.

pub mod assemble;
pub mod capture;
pub mod document;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod surface;

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use tracing::Instrument;

use crate::analytics::AnalyticsRecord;
use crate::config::{Config, ReportConfig};
use crate::error::AssemblyError;

pub use assemble::{assemble_document, humanize_key, NO_CHARTS_WARNING};
pub use capture::{
    encode_png, is_blank, CapturedChartImage, ChartCapturer, ChartElement, ChartSurface,
    RenderBackend,
};
pub use document::{Block, Document, Section, SectionKind};
pub use layout::{layout, wrap_text, FontFace, LayoutOp, Page, PageGeometry};
pub use pdf::render_pdf;
pub use surface::StaticChartSurface;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A finished export, ready to be handed to a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn filename_stem(id: &str, at: DateTime<Utc>) -> String {
    let id: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let timestamp: String = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .chars()
        .filter(|c| *c != ':' && *c != '.')
        .collect();
    format!("analytics-report-{}-{}", id, timestamp)
}

/// `analytics-report-{id}-{timestamp}.pdf`, where the timestamp is RFC 3339
/// with milliseconds and without `:` or `.`.
pub fn report_filename(id: &str, at: DateTime<Utc>) -> String {
    format!("{}.pdf", filename_stem(id, at))
}

pub struct ReportAssembler {
    config: ReportConfig,
    capturer: ChartCapturer,
}

impl ReportAssembler {
    pub fn new(config: ReportConfig, capturer: ChartCapturer) -> Self {
        Self { config, capturer }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.report.clone(),
            ChartCapturer::from_config(&config.capture),
        )
    }

    pub fn report_config(&self) -> &ReportConfig {
        &self.config
    }

    /// Captures the charts on `surface`, assembles the report and renders it
    /// to PDF. Charts that fail to capture fall back to text; only a failure
    /// to produce the document itself is an error.
    pub async fn export(
        &self,
        record: &AnalyticsRecord,
        surface: &dyn ChartSurface,
    ) -> Result<ReportArtifact, AssemblyError> {
        self.export_at(record, surface, Utc::now()).await
    }

    /// Same as [`export`](Self::export) with an explicit generation time.
    pub async fn export_at(
        &self,
        record: &AnalyticsRecord,
        surface: &dyn ChartSurface,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportArtifact, AssemblyError> {
        let analysis_id = record.display_id();
        let span = tracing::info_span!("export_report", analysis_id = %analysis_id);

        async {
            let images = self.capturer.capture_chart_images(surface).await;
            let document = assemble_document(record, &images, generated_at, &self.config);
            // Images only live for this export.
            drop(images);

            let bytes = render_pdf(&document)?;
            let filename = report_filename(&analysis_id, generated_at);
            info!(
                "Exported report {} ({} sections, {} bytes)",
                filename,
                document.sections.len(),
                bytes.len()
            );

            Ok::<_, AssemblyError>(ReportArtifact {
                filename,
                content_type: PDF_CONTENT_TYPE,
                bytes,
            })
        }
        .instrument(span)
        .await
    }

    /// The raw record as pretty-printed JSON, named like the PDF export.
    pub fn export_json(
        &self,
        record: &AnalyticsRecord,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportArtifact, AssemblyError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        Ok(ReportArtifact {
            filename: format!("{}.json", filename_stem(&record.display_id(), generated_at)),
            content_type: JSON_CONTENT_TYPE,
            bytes,
        })
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(ReportConfig::default(), ChartCapturer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_filename() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(
            report_filename("abc-123", at),
            "analytics-report-abc-123-2024-03-05T140709123Z.pdf"
        );
    }

    #[test]
    fn test_report_filename_sanitizes_id() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            report_filename("a/b c", at),
            "analytics-report-a-b-c-2024-01-01T000000000Z.pdf"
        );
    }

    #[test]
    fn test_export_json_uses_same_stem() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = AnalyticsRecord {
            uuid: "u-1".into(),
            ..AnalyticsRecord::default()
        };
        let artifact = ReportAssembler::default().export_json(&record, at).unwrap();
        assert_eq!(artifact.filename, "analytics-report-u-1-2024-01-01T000000000Z.json");
        assert_eq!(artifact.content_type, JSON_CONTENT_TYPE);
        let value: serde_json::Value = serde_json::from_slice(&artifact.bytes).unwrap();
        assert_eq!(value["uuid"], "u-1");
    }
}
