//! Headless chart surface: charts are drawn from their specs in memory.

use async_trait::async_trait;
use image::RgbaImage;

use super::capture::{ChartElement, ChartSurface, RenderBackend};
use super::raster::rasterize;
use crate::analytics::AnalyticsRecord;
use crate::charts::{describe, ChartSpec, PlotType};
use crate::config::ReportConfig;
use crate::error::CaptureError;

/// Renders [`ChartSpec`]s without a browser so exports work anywhere.
pub struct StaticChartSurface {
    charts: Vec<ChartSpec>,
    width: u32,
    height: u32,
}

impl StaticChartSurface {
    pub fn new(charts: Vec<ChartSpec>, width: u32, height: u32) -> Self {
        Self {
            charts,
            width,
            height,
        }
    }

    /// Surface holding the normalized charts of a record.
    pub fn from_record(record: &AnalyticsRecord, config: &ReportConfig) -> Self {
        Self::new(record.charts(), config.chart_width, config.chart_height)
    }

    fn chart(&self, chart_id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == chart_id)
    }
}

fn backend_for(plot_type: PlotType) -> RenderBackend {
    match plot_type {
        PlotType::Pie | PlotType::Donut | PlotType::Gauge => RenderBackend::Vector,
        _ => RenderBackend::Canvas,
    }
}

#[async_trait]
impl ChartSurface for StaticChartSurface {
    fn elements(&self) -> Vec<ChartElement> {
        self.charts
            .iter()
            .map(|chart| ChartElement {
                chart_id: chart.id.clone(),
                title: chart.title.clone(),
                plot_type: chart.plot_type,
                width: self.width,
                height: self.height,
                backend: backend_for(chart.plot_type),
            })
            .collect()
    }

    async fn has_content(&self, chart_id: &str) -> bool {
        self.chart(chart_id)
            .map(|chart| describe(chart, self.width, self.height).has_marks())
            .unwrap_or(false)
    }

    async fn rasterize(&self, element: &ChartElement) -> Result<RgbaImage, CaptureError> {
        let chart = self
            .chart(&element.chart_id)
            .ok_or_else(|| CaptureError::Rasterize {
                chart_id: element.chart_id.clone(),
                reason: "chart is no longer on the surface".to_string(),
            })?;
        Ok(rasterize(&describe(chart, element.width, element.height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{normalize, RawChart};
    use crate::report::capture::ChartCapturer;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_surface_captures_every_chart() {
        let charts = vec![
            normalize(&RawChart::new(json!({"id": "a", "labels": ["x", "y"], "values": [1, 2]})), 0),
            normalize(&RawChart::new(json!({"id": "b", "value": 70})), 1),
        ];
        let surface = StaticChartSurface::new(charts, 320, 200);
        let images = ChartCapturer::default().capture_chart_images(&surface).await;

        let ids: Vec<&str> = images.iter().map(|i| i.chart_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!((images[0].width, images[0].height), (320, 200));
    }

    #[tokio::test]
    async fn test_zero_sized_surface_captures_nothing() {
        let charts = vec![normalize(&RawChart::new(json!({"value": 5})), 0)];
        let surface = StaticChartSurface::new(charts, 0, 0);
        let images = ChartCapturer::default().capture_chart_images(&surface).await;
        assert!(images.is_empty());
    }
}
