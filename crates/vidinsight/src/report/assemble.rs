//! Assembly of the report document from an analytics record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::capture::CapturedChartImage;
use super::document::{Block, Document, Section, SectionKind};
use crate::analytics::AnalyticsRecord;
use crate::charts::ChartSpec;
use crate::config::ReportConfig;

/// Banner shown on the cover when no chart could be captured.
pub const NO_CHARTS_WARNING: &str =
    "No charts captured. Chart sections below show their data as text instead.";

/// Builds the report. Never fails: missing images fall back to text and a
/// report without any captured chart is still complete.
pub fn assemble_document(
    record: &AnalyticsRecord,
    images: &[CapturedChartImage],
    generated_at: DateTime<Utc>,
    config: &ReportConfig,
) -> Document {
    let charts = record.charts();
    let mut sections = vec![
        cover(record, &charts, images, generated_at, config),
        metrics(record),
    ];

    for chart in &charts {
        let image = images.iter().find(|i| i.chart_id == chart.id);
        sections.push(chart_section(chart, image));
    }

    if let Some(summary) = summary(record) {
        sections.push(summary);
    }

    if config.include_raw_data {
        sections.extend(raw_data(record));
    }

    Document {
        title: config.title.clone(),
        analysis_id: record.display_id(),
        generated_at,
        sections,
    }
}

fn cover(
    record: &AnalyticsRecord,
    charts: &[ChartSpec],
    images: &[CapturedChartImage],
    generated_at: DateTime<Utc>,
    config: &ReportConfig,
) -> Section {
    let mut section = Section::new(SectionKind::Cover, config.title.clone());
    section.push(Block::heading(config.title.clone(), 1));
    if let Some(title) = record.video_title.as_deref().filter(|t| !t.trim().is_empty()) {
        section.push(Block::paragraph(title));
    }
    section.push(Block::key_value(
        "Generated",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ));
    section.push(Block::key_value("Analysis ID", record.display_id()));
    section.push(Block::key_value(
        "Confidence score",
        format!("{:.1}%", record.confidence_percent()),
    ));
    section.push(Block::key_value(
        "Metrics",
        record.parsed_metrics.len().to_string(),
    ));
    section.push(Block::key_value("Charts", charts.len().to_string()));
    section.push(Block::key_value("Images captured", images.len().to_string()));

    if images.is_empty() {
        section.push(Block::Warning {
            text: NO_CHARTS_WARNING.to_string(),
        });
    }
    section
}

/// Turns `engagement_rate` / `engagementRate` into `Engagement Rate`.
pub fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn metrics(record: &AnalyticsRecord) -> Section {
    let mut section = Section::new(SectionKind::Metrics, "Key Metrics");
    section.push(Block::heading("Key Metrics", 2));

    let mut shown = 0;
    for (key, value) in &record.parsed_metrics {
        if let Some(display) = value.display() {
            section.push(Block::key_value(humanize_key(key), display));
            shown += 1;
        }
    }
    if shown == 0 {
        section.push(Block::paragraph("No metrics available."));
    }
    section
}

fn chart_section(chart: &ChartSpec, image: Option<&CapturedChartImage>) -> Section {
    let mut section = Section::new(SectionKind::Chart, chart.title.clone())
        .page_break()
        .keep_together();
    section.push(Block::heading(chart.title.clone(), 2));
    section.push(Block::Badge {
        status: chart.status,
    });

    match image {
        Some(image) => section.push(Block::Image {
            image: image.clone(),
        }),
        None => {
            let lead = if chart.is_available() {
                format!("{} chart (image not captured):", chart.plot_type)
            } else {
                "Chart data unavailable:".to_string()
            };
            section.push(Block::paragraph(lead));
            section.push(Block::BulletList {
                items: chart.series_lines(),
            });
        }
    }

    if !chart.insights.is_empty() {
        section.push(Block::heading("Insights", 3));
        section.push(Block::BulletList {
            items: chart.insights.clone(),
        });
    }
    section
}

fn summary(record: &AnalyticsRecord) -> Option<Section> {
    let summary = record.summary()?;
    let mut section = Section::new(SectionKind::Summary, "Summary").page_break();
    section.push(Block::heading("Summary", 2));

    for paragraph in summary
        .content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        section.push(Block::paragraph(paragraph));
    }

    for part in &summary.sections {
        if part.content.trim().is_empty() {
            continue;
        }
        if !part.title.trim().is_empty() {
            section.push(Block::heading(part.title.clone(), 3));
        }
        section.push(Block::paragraph(part.content.trim()));
    }

    if !summary.metrics_highlighted.is_empty() {
        section.push(Block::heading("Highlighted metrics", 3));
        section.push(Block::BulletList {
            items: summary.metrics_highlighted.clone(),
        });
    }
    section.push(Block::key_value(
        "Word count",
        summary.effective_word_count().to_string(),
    ));
    Some(section)
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Block {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Block::Code { text },
        Err(e) => Block::paragraph(format!("Could not serialize data: {}", e)),
    }
}

fn raw_data(record: &AnalyticsRecord) -> Vec<Section> {
    let metadata = json!({
        "id": record.id,
        "uuid": record.uuid,
        "status": record.status,
        "confidenceScore": record.confidence_score,
        "videoTitle": record.video_title,
        "processingStartedAt": record.processing_started_at,
        "processingCompletedAt": record.processing_completed_at,
    });

    let parts: [(&str, Block); 4] = [
        ("Raw Data: Metrics", pretty(&record.parsed_metrics)),
        ("Raw Data: Charts", pretty(&record.generated_charts)),
        ("Raw Data: Metadata", pretty(&metadata)),
        ("Raw Data: Complete Record", pretty(record)),
    ];

    parts
        .into_iter()
        .map(|(title, block)| {
            let mut section = Section::new(SectionKind::RawData, title).page_break();
            section.push(Block::heading(title, 2));
            section.push(block);
            section
        })
        .collect()
}
