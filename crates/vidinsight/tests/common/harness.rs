//! Scripted fakes for the analytics backend and the chart surface.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use vidinsight::analytics::{AnalyticsRecord, GeneratedSummary};
use vidinsight::charts::{PlotType, RawChart};
use vidinsight::client::{
    AnalyticsClient, ClientError, DeleteAck, JobListPage, JobQuery, ServerJobRecord,
    SubmitJobPayload, SubmitJobResponse,
};
use vidinsight::error::CaptureError;
use vidinsight::report::{ChartElement, ChartSurface, RenderBackend};

/// Analytics backend whose answers are set by the test.
pub struct FakeClient {
    submit_response: Mutex<SubmitJobResponse>,
    listing: Mutex<Vec<ServerJobRecord>>,
    fail_listing: Mutex<Option<ClientError>>,
    records: Mutex<HashMap<String, AnalyticsRecord>>,
    list_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            submit_response: Mutex::new(SubmitJobResponse::default()),
            listing: Mutex::new(Vec::new()),
            fail_listing: Mutex::new(None),
            records: Mutex::new(HashMap::new()),
            list_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }

    /// Every submission will be answered with this job id.
    pub fn with_job_id(self, job_id: &str) -> Self {
        self.respond_to_submit(SubmitJobResponse {
            job_id: Some(job_id.to_string()),
            video_id: Some(7),
            status: Some("processing".to_string()),
            ..SubmitJobResponse::default()
        });
        self
    }

    pub fn respond_to_submit(&self, response: SubmitJobResponse) {
        *self.submit_response.lock().unwrap() = response;
    }

    pub fn set_listing(&self, records: Vec<ServerJobRecord>) {
        *self.listing.lock().unwrap() = records;
    }

    /// The next listing request fails with `err`.
    pub fn fail_next_listing(&self, err: ClientError) {
        *self.fail_listing.lock().unwrap() = Some(err);
    }

    pub fn insert_record(&self, job_id: &str, record: AnalyticsRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(job_id.to_string(), record);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsClient for FakeClient {
    async fn submit_job(&self, _payload: &SubmitJobPayload) -> Result<SubmitJobResponse, ClientError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.submit_response.lock().unwrap().clone())
    }

    async fn list_jobs(&self, _query: &JobQuery) -> Result<JobListPage, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_listing.lock().unwrap().take() {
            return Err(err);
        }
        let data = self.listing.lock().unwrap().clone();
        Ok(JobListPage {
            total: data.len() as u64,
            data,
        })
    }

    async fn get_analytics(&self, job_id: &str) -> Result<AnalyticsRecord, ClientError> {
        self.records
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(job_id.to_string()))
    }

    async fn get_charts(&self, job_id: &str) -> Result<Vec<RawChart>, ClientError> {
        self.get_analytics(job_id)
            .await
            .map(|record| record.generated_charts)
    }

    async fn get_summary(&self, job_id: &str) -> Result<GeneratedSummary, ClientError> {
        self.get_analytics(job_id)
            .await
            .map(|record| record.generated_summary.unwrap_or_default())
    }

    async fn delete_analytics(&self, job_id: &str) -> Result<DeleteAck, ClientError> {
        let removed = self.records.lock().unwrap().remove(job_id);
        Ok(DeleteAck {
            success: removed.is_some(),
            message: None,
        })
    }
}

/// How one chart on a [`FakeSurface`] behaves when captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureBehavior {
    /// Content is ready immediately.
    Ready,
    /// Content appears after this many readiness checks.
    ReadyAfter(usize),
    /// Never produces content.
    NeverReady,
    /// Reports content but always rasterizes to a blank frame.
    Blank,
    /// Rasterization errors out.
    Fails,
    /// The container has no size yet.
    ZeroSized,
}

struct FakeChart {
    chart_id: String,
    behavior: CaptureBehavior,
    checks: AtomicUsize,
}

/// Chart surface driven entirely by the test.
pub struct FakeSurface {
    charts: Vec<FakeChart>,
    rasterize_calls: AtomicUsize,
}

impl FakeSurface {
    pub fn new(charts: &[(&str, CaptureBehavior)]) -> Self {
        Self {
            charts: charts
                .iter()
                .map(|(chart_id, behavior)| FakeChart {
                    chart_id: chart_id.to_string(),
                    behavior: *behavior,
                    checks: AtomicUsize::new(0),
                })
                .collect(),
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    pub fn rasterize_calls(&self) -> usize {
        self.rasterize_calls.load(Ordering::SeqCst)
    }

    fn chart(&self, chart_id: &str) -> Option<&FakeChart> {
        self.charts.iter().find(|c| c.chart_id == chart_id)
    }
}

#[async_trait]
impl ChartSurface for FakeSurface {
    fn elements(&self) -> Vec<ChartElement> {
        self.charts
            .iter()
            .enumerate()
            .map(|(index, chart)| {
                let (width, height) = match chart.behavior {
                    CaptureBehavior::ZeroSized => (0, 0),
                    _ => (32, 24),
                };
                ChartElement {
                    chart_id: chart.chart_id.clone(),
                    title: format!("Chart {}", index + 1),
                    plot_type: PlotType::Bar,
                    width,
                    height,
                    backend: if index % 2 == 0 {
                        RenderBackend::Vector
                    } else {
                        RenderBackend::Canvas
                    },
                }
            })
            .collect()
    }

    async fn has_content(&self, chart_id: &str) -> bool {
        let Some(chart) = self.chart(chart_id) else {
            return false;
        };
        let checks = chart.checks.fetch_add(1, Ordering::SeqCst) + 1;
        match chart.behavior {
            CaptureBehavior::Ready | CaptureBehavior::Blank | CaptureBehavior::Fails => true,
            CaptureBehavior::ReadyAfter(n) => checks > n,
            CaptureBehavior::NeverReady | CaptureBehavior::ZeroSized => false,
        }
    }

    async fn rasterize(&self, element: &ChartElement) -> Result<RgbaImage, CaptureError> {
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .chart(&element.chart_id)
            .map(|c| c.behavior)
            .unwrap_or(CaptureBehavior::Fails);

        let mut frame = RgbaImage::from_pixel(element.width, element.height, Rgba([255, 255, 255, 255]));
        match behavior {
            CaptureBehavior::Fails => Err(CaptureError::Rasterize {
                chart_id: element.chart_id.clone(),
                reason: "canvas tainted".to_string(),
            }),
            CaptureBehavior::Blank => Ok(frame),
            _ => {
                for x in 0..element.width / 2 {
                    frame.put_pixel(x, element.height / 2, Rgba([37, 99, 235, 255]));
                }
                Ok(frame)
            }
        }
    }
}
