//! API integration tests driven through the router with in-memory fakes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use deepscan_api::{create_router, ApiConfig, AppState};
use deepscan_inference::{FramePredictor, InferenceError, InferenceService, ModelPair};
use deepscan_media::{AudioAnalyzer, Frame, FrameSampler, MediaError, MediaResult, VideoProbe, VideoProber};
use deepscan_models::{AnalysisId, AnalysisResult, AudioAnalysis, FramePrediction, Verdict};
use deepscan_pipeline::{AnalysisPipeline, PipelineConfig};
use deepscan_storage::{AnalysisStore, StorageError, StorageResult};

const BOUNDARY: &str = "deepscan-test-boundary";

struct FakeProber;

#[async_trait]
impl VideoProber for FakeProber {
    async fn probe(&self, path: &Path) -> MediaResult<VideoProbe> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Ok(VideoProbe {
            duration: 8.0,
            fps: 25.0,
            frame_count: 200,
            width: 640,
            height: 360,
            codec: "h264".to_string(),
            has_audio: false,
        })
    }
}

/// Writes `count` placeholder frames, or fails like an undecodable file.
struct FakeSampler {
    count: usize,
}

#[async_trait]
impl FrameSampler for FakeSampler {
    async fn sample(
        &self,
        _video_path: &Path,
        output_dir: &Path,
        interval_secs: f64,
    ) -> MediaResult<Vec<Frame>> {
        if self.count == 0 {
            return Err(MediaError::decode("moov atom not found"));
        }
        let mut frames = Vec::new();
        for i in 0..self.count {
            let path = output_dir.join(format!("sample_{:06}.jpg", i));
            tokio::fs::write(&path, b"jpeg").await?;
            frames.push(Frame {
                path,
                time: i as f64 * interval_secs,
                index: i as u64,
            });
        }
        Ok(frames)
    }
}

/// Every frame is FAKE according to the first model.
struct FakePredictor;

impl FramePredictor for FakePredictor {
    fn predict(&self, _image_path: &Path, time: f64) -> FramePrediction {
        FramePrediction::from_models(time, (Verdict::Fake, 0.92), (Verdict::Real, 0.61))
    }
}

struct SilentAudio;

#[async_trait]
impl AudioAnalyzer for SilentAudio {
    async fn analyze(&self, _video_path: &Path) -> AudioAnalysis {
        AudioAnalysis::no_audio()
    }
}

#[derive(Default)]
struct MemoryStore {
    results: Mutex<HashMap<String, AnalysisResult>>,
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn save(&self, id: &AnalysisId, result: &AnalysisResult) -> StorageResult<()> {
        self.results
            .lock()
            .unwrap()
            .insert(id.to_string(), result.clone());
        Ok(())
    }

    async fn load(&self, id: &AnalysisId) -> StorageResult<AnalysisResult> {
        self.results
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::not_found(id.as_str()))
    }

    async fn exists(&self, id: &AnalysisId) -> StorageResult<bool> {
        Ok(self.results.lock().unwrap().contains_key(id.as_str()))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

struct TestApp {
    base: TempDir,
    router: Router,
}

impl TestApp {
    fn scratch_dir(&self) -> PathBuf {
        self.base.path().join("scratch")
    }
}

fn test_app(frames: usize, inference: Option<Arc<InferenceService>>) -> TestApp {
    test_app_with_config(frames, inference, ApiConfig::default())
}

fn test_app_with_config(
    frames: usize,
    inference: Option<Arc<InferenceService>>,
    config: ApiConfig,
) -> TestApp {
    let base = TempDir::new().unwrap();
    let pipeline_config = PipelineConfig {
        scratch_dir: base.path().join("scratch"),
        results_dir: base.path().join("results"),
        ..Default::default()
    };
    let pipeline = AnalysisPipeline::new(
        pipeline_config,
        Arc::new(FakeProber),
        Arc::new(FakeSampler { count: frames }),
        Arc::new(FakePredictor),
        Arc::new(SilentAudio),
        Arc::new(MemoryStore::default()),
    );
    let state = AppState::from_parts(config, pipeline, inference);

    TestApp {
        base,
        router: create_router(state, None),
    }
}

/// (field name, optional file name, content)
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: video/mp4\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn scratch_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|d| d.count() == 0).unwrap_or(true)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(3, None);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(3, None);

    let request = Request::builder()
        .uri("/healthz")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_ready_reports_unloaded_models_as_ready() {
    let service = Arc::new(InferenceService::new(|| -> Result<ModelPair, InferenceError> {
        Err(InferenceError::model_load("model.onnx missing"))
    }));
    let app = test_app(3, Some(service));

    let response = app.router.oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["models"]["state"], "unloaded");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_ready_fails_after_model_load_failure() {
    let service = Arc::new(InferenceService::new(|| -> Result<ModelPair, InferenceError> {
        Err(InferenceError::model_load("model.onnx missing"))
    }));
    assert!(service.models().await.is_err());
    let app = test_app(3, Some(service));

    let response = app.router.oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["models"]["state"], "failed");
    assert!(body["checks"]["models"]["error"]
        .as_str()
        .unwrap()
        .contains("model.onnx missing"));
}

#[tokio::test]
async fn test_analyze_then_fetch_result() {
    let app = test_app(4, None);

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("user_id", None, b"user-42"),
            ("video", Some("clip.mp4"), b"fake video bytes"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body.get("error").is_none(), "unexpected failure: {}", body);
    assert_eq!(body["video_name"], "clip.mp4");
    assert_eq!(body["user_id"], "user-42");
    assert_eq!(body["summary"]["overall_result"], "FAKE");
    assert_eq!(body["summary"]["total_frames"], 4);
    assert_eq!(body["raw_frame_results"].as_array().unwrap().len(), 4);
    assert!(scratch_is_empty(&app.scratch_dir()));

    let id = body["videoId"].as_str().unwrap().to_string();
    let response = app
        .router
        .oneshot(get(&format!("/get-result/{}", id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = json_body(response).await;
    assert_eq!(stored, body);
}

#[tokio::test]
async fn test_missing_video_field() {
    let app = test_app(3, None);

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[("user_id", None, b"user-42")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing required field: video");
    assert_eq!(body["video_name"], "");
    assert!(scratch_is_empty(&app.scratch_dir()));
}

#[tokio::test]
async fn test_missing_user_id_field() {
    let app = test_app(3, None);

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[("video", Some("clip.mp4"), b"bytes")]))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing required field: user_id");
    assert_eq!(body["video_name"], "clip.mp4");
    assert!(scratch_is_empty(&app.scratch_dir()));
}

#[tokio::test]
async fn test_non_multipart_body_uses_error_shape() {
    let app = test_app(3, None);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert_eq!(body["video_name"], "");
}

#[tokio::test]
async fn test_oversized_upload_uses_error_shape() {
    let config = ApiConfig {
        max_body_size: 1024,
        ..Default::default()
    };
    let app = test_app_with_config(3, None, config);

    let video = vec![0u8; 4096];
    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("user_id", None, b"user-42"),
            ("video", Some("large.mp4"), &video),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(body["video_name"].is_string());
    assert!(body.get("summary").is_none());
    assert!(scratch_is_empty(&app.scratch_dir()));
}

#[tokio::test]
async fn test_undecodable_video_is_reported() {
    let app = test_app(0, None);

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("user_id", None, b"user-42"),
            ("video", Some("broken.mp4"), b"garbage"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("moov atom not found"));
    assert_eq!(body["video_name"], "broken.mp4");
    assert!(scratch_is_empty(&app.scratch_dir()));
}

#[tokio::test]
async fn test_get_result_not_found() {
    let app = test_app(3, None);

    let response = app
        .router
        .oneshot(get(&format!("/get-result/{}", AnalysisId::new())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_get_result_rejects_invalid_id() {
    let app = test_app(3, None);

    let response = app
        .router
        .oneshot(get("/get-result/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("not-a-uuid"));
}

#[tokio::test]
async fn test_request_metrics_use_route_templates() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);
    let app = test_app(3, None);

    let id = AnalysisId::new();
    app.router
        .clone()
        .oneshot(get(&format!("/get-result/{}", id)))
        .await
        .unwrap();
    let response = app
        .router
        .oneshot(get("/wp-admin/scan-7f3a9c"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let rendered = handle.render();
    assert!(rendered.contains(r#"path="/get-result/:analysis_id""#));
    assert!(rendered.contains(r#"path="unmatched""#));
    assert!(!rendered.contains(&id.to_string()));
    assert!(!rendered.contains("scan-7f3a9c"));
}
