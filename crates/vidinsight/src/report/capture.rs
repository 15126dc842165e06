//! Capture of rendered charts as PNG images.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::Instrument;

use crate::charts::PlotType;
use crate::config::CaptureConfig;
use crate::error::CaptureError;

/// Primitive a chart was rendered with. Both are captured the same way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    Vector,
    Canvas,
}

/// One rendered chart container, addressed by chart id.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartElement {
    pub chart_id: String,
    pub title: String,
    pub plot_type: PlotType,
    pub width: u32,
    pub height: u32,
    pub backend: RenderBackend,
}

impl ChartElement {
    pub fn is_zero_sized(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Where rendered charts live. In a browser shell this is the DOM; the
/// crate ships a headless implementation.
#[async_trait]
pub trait ChartSurface: Send + Sync {
    /// Chart containers in document order.
    fn elements(&self) -> Vec<ChartElement>;

    /// Whether the chart has produced visual content yet.
    async fn has_content(&self, chart_id: &str) -> bool;

    async fn rasterize(&self, element: &ChartElement) -> Result<RgbaImage, CaptureError>;
}

/// A captured chart. Lives only for the duration of one export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedChartImage {
    pub chart_id: String,
    pub title: String,
    /// Base64-encoded PNG.
    pub image_data: String,
    pub width: u32,
    pub height: u32,
    pub plot_type: PlotType,
}

impl CapturedChartImage {
    pub fn png_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.image_data)
    }
}

/// True when every pixel is the same, i.e. nothing was drawn.
pub fn is_blank(frame: &RgbaImage) -> bool {
    let mut pixels = frame.pixels();
    match pixels.next() {
        None => true,
        Some(first) => pixels.all(|p| p == first),
    }
}

/// Encodes a frame as base64 PNG.
pub fn encode_png(chart_id: &str, frame: RgbaImage) -> Result<String, CaptureError> {
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(frame)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode {
            chart_id: chart_id.to_string(),
            reason: e.to_string(),
        })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

/// Captures every chart of a surface, one at a time, under one shared
/// deadline.
#[derive(Debug, Clone)]
pub struct ChartCapturer {
    poll_interval: Duration,
    max_wait: Duration,
}

impl ChartCapturer {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.max_wait_ms),
        )
    }

    /// Captures all charts that can be captured. Zero-sized elements are
    /// skipped and a chart whose capture fails is logged and left out; the
    /// batch always completes.
    pub async fn capture_chart_images(&self, surface: &dyn ChartSurface) -> Vec<CapturedChartImage> {
        let elements = surface.elements();
        let span = tracing::info_span!("capture_charts", charts = elements.len());

        async {
            let deadline = Instant::now() + self.max_wait;
            let mut images = Vec::with_capacity(elements.len());

            for element in &elements {
                if element.is_zero_sized() {
                    debug!("Skipping chart '{}': not rendered yet", element.chart_id);
                    continue;
                }
                match self.capture_one(surface, element, deadline).await {
                    Ok(image) => images.push(image),
                    Err(e) => warn!("Skipping chart capture: {}", e),
                }
            }

            info!("Captured {} of {} charts", images.len(), elements.len());
            images
        }
        .instrument(span)
        .await
    }

    async fn capture_one(
        &self,
        surface: &dyn ChartSurface,
        element: &ChartElement,
        deadline: Instant,
    ) -> Result<CapturedChartImage, CaptureError> {
        let started = Instant::now();

        loop {
            if surface.has_content(&element.chart_id).await {
                let frame = surface.rasterize(element).await?;
                if !is_blank(&frame) {
                    debug!(
                        "Captured chart '{}' ({:?}, {}x{})",
                        element.chart_id,
                        element.backend,
                        frame.width(),
                        frame.height()
                    );
                    let (width, height) = frame.dimensions();
                    return Ok(CapturedChartImage {
                        chart_id: element.chart_id.clone(),
                        title: element.title.clone(),
                        image_data: encode_png(&element.chart_id, frame)?,
                        width,
                        height,
                        plot_type: element.plot_type,
                    });
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CaptureError::NotReady {
                    chart_id: element.chart_id.clone(),
                    waited_ms: now.duration_since(started).as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

impl Default for ChartCapturer {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}
