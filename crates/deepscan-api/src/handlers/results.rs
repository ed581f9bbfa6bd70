//! Stored analysis lookup.

use axum::extract::{Path, State};
use axum::Json;
use deepscan_models::{AnalysisId, AnalysisResult};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fetch a previously stored analysis result.
pub async fn get_result(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<AnalysisResult>> {
    let id = AnalysisId::parse(&analysis_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(analysis_id = %id, "Loading analysis result");
    let result = state.store.load(&id).await?;

    Ok(Json(result))
}
