#![allow(dead_code)]

use leaf_check::{
    config::Config,
    error::SubmissionError,
    intake::{FileCandidate, SelectedFile},
    service::{ClassifierService, HealthResponse, PredictResponse},
    workflow::UploadWorkflow,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const FAKE_BASE_URL: &str = "http://fake.test:5000";

/// In-process stand-in for the classification server.
pub struct FakeService {
    pub predict_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    predict_reply: Mutex<Result<PredictResponse, SubmissionError>>,
    health_reply: Result<HealthResponse, SubmissionError>,
    delay: Duration,
}

impl FakeService {
    pub fn replying(resp: PredictResponse) -> Self {
        Self {
            predict_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            predict_reply: Mutex::new(Ok(resp)),
            health_reply: Ok(healthy()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(err: SubmissionError) -> Self {
        let svc = Self::replying(PredictResponse::default());
        svc.set_predict_reply(Err(err));
        svc
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_health(mut self, reply: Result<HealthResponse, SubmissionError>) -> Self {
        self.health_reply = reply;
        self
    }

    pub fn set_predict_reply(&self, reply: Result<PredictResponse, SubmissionError>) {
        *self.predict_reply.lock().unwrap() = reply;
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }
}

impl ClassifierService for FakeService {
    async fn predict(&self, _file: &SelectedFile) -> Result<PredictResponse, SubmissionError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.predict_reply.lock().unwrap().clone()
    }

    async fn health(&self) -> Result<HealthResponse, SubmissionError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health_reply.clone()
    }

    fn base_url(&self) -> &str {
        FAKE_BASE_URL
    }
}

/// Replies with `durian_response` after `delay`.
pub fn slow(delay: Duration) -> FakeService {
    FakeService::replying(durian_response()).with_delay(delay)
}

/// Predicts normally; every health request fails with `err`.
pub fn unhealthy(err: SubmissionError) -> FakeService {
    FakeService::replying(durian_response()).with_health(Err(err))
}

/// Stages a small valid PNG named `name`.
pub async fn stage<S: ClassifierService>(wf: &UploadWorkflow<S>, name: &str) {
    wf.select_file(png_candidate(name)).await.expect("staged");
}

pub fn workflow(service: FakeService) -> UploadWorkflow<FakeService> {
    UploadWorkflow::new(&Config::default(), service)
}

pub fn healthy() -> HealthResponse {
    HealthResponse {
        status: Some("healthy".into()),
        model_status: Some("loaded".into()),
        data_status: Some("loaded".into()),
        timestamp: Some("2024-06-01 12:00:00".into()),
    }
}

pub fn durian_response() -> PredictResponse {
    serde_json::from_value(serde_json::json!({
        "success": true,
        "model_prediction": "Durian A",
        "input_features": {
            "contrast": 1.23456789,
            "correlation": 0.5,
            "energy": 0.25,
            "homogeneity": 0.75
        },
        "closest_match": {"label": "Durian A", "index": 12, "distance": 0.4},
        "top_5_matches": [
            {"label": "X", "index": 0, "distance": 2.5}
        ],
        "total_comparisons": 120
    }))
    .expect("valid predict response")
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([24, 120, 48]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub fn png_candidate(name: &str) -> FileCandidate {
    FileCandidate::new(name, "image/png", png_bytes(4, 3))
}
