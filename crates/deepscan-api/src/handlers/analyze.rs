//! Video upload and analysis.
//!
//! `POST /` always answers 200: either the full [`AnalysisResult`] or an
//! [`AnalysisFailure`] body naming the error and the uploaded file.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use deepscan_models::{AnalysisFailure, AnalysisId, AnalysisResult};
use deepscan_pipeline::{AnalysisRequest, ScratchSpace};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::state::AppState;

const USER_ID_FIELD: &str = "user_id";
const VIDEO_FIELD: &str = "video";

/// Body of `POST /`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Success(Box<AnalysisResult>),
    Failure(AnalysisFailure),
}

/// Uploaded video saved into scratch space.
struct Upload {
    user_id: String,
    video_name: String,
    video_path: PathBuf,
}

/// Analyze an uploaded video.
pub async fn analyze_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<AnalyzeResponse> {
    let analysis_id = AnalysisId::new();

    let response = match run_analysis(&state, analysis_id.clone(), multipart).await {
        Ok(result) => {
            info!(
                analysis_id = %analysis_id,
                overall_result = %result.summary.overall_result,
                "Analysis returned"
            );
            AnalyzeResponse::Success(Box::new(result))
        }
        Err(failure) => {
            warn!(
                analysis_id = %analysis_id,
                video_name = %failure.video_name,
                error = %failure.error,
                "Analysis failed"
            );
            AnalyzeResponse::Failure(failure)
        }
    };

    Json(response)
}

async fn run_analysis(
    state: &AppState,
    analysis_id: AnalysisId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<AnalysisResult, AnalysisFailure> {
    let multipart = multipart.map_err(|e| AnalysisFailure::new(e.body_text(), ""))?;

    let scratch = state
        .pipeline
        .create_scratch(&analysis_id)
        .await
        .map_err(|e| AnalysisFailure::new(e.to_string(), ""))?;

    let upload = receive_upload(multipart, &scratch).await?;
    let video_name = upload.video_name.clone();

    let request = AnalysisRequest {
        analysis_id,
        user_id: upload.user_id,
        video_name: upload.video_name,
        video_path: upload.video_path,
        scratch,
    };

    // A panic inside the pipeline unwinds the task, which drops the request
    // and its scratch space with it.
    let pipeline = state.pipeline.clone();
    match tokio::spawn(async move { pipeline.analyze(request).await }).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(AnalysisFailure::new(e.to_string(), video_name)),
        Err(e) => Err(AnalysisFailure::new(
            format!("Analysis task failed: {}", e),
            video_name,
        )),
    }
}

/// Read the multipart form, streaming the video into scratch space.
async fn receive_upload(
    mut multipart: Multipart,
    scratch: &ScratchSpace,
) -> Result<Upload, AnalysisFailure> {
    let mut user_id = None;
    let mut video: Option<(String, PathBuf)> = None;

    loop {
        let video_name = video.as_ref().map(|(name, _)| name.as_str()).unwrap_or("");
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(AnalysisFailure::new(e.body_text(), video_name)),
        };

        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(USER_ID_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AnalysisFailure::new(e.body_text(), video_name))?;
                user_id = Some(text.trim().to_string());
            }
            Some(VIDEO_FIELD) => {
                let name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("video")
                    .to_string();
                let path = scratch.upload_path(&name);
                save_field(field, &path)
                    .await
                    .map_err(|e| AnalysisFailure::new(e, name.clone()))?;
                video = Some((name, path));
            }
            _ => {}
        }
    }

    let Some((video_name, video_path)) = video else {
        return Err(AnalysisFailure::new(
            format!("Missing required field: {}", VIDEO_FIELD),
            "",
        ));
    };

    let user_id = match user_id {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(AnalysisFailure::new(
                format!("Missing required field: {}", USER_ID_FIELD),
                video_name,
            ))
        }
    };

    Ok(Upload {
        user_id,
        video_name,
        video_path,
    })
}

/// Stream a multipart field to disk chunk by chunk.
async fn save_field(mut field: Field<'_>, path: &Path) -> Result<u64, String> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| format!("Failed to store upload: {}", e))?;

    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(|e| e.body_text())? {
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("Failed to store upload: {}", e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| format!("Failed to store upload: {}", e))?;

    if written == 0 {
        return Err("Uploaded video is empty".to_string());
    }
    Ok(written)
}
