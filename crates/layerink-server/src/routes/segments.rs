use axum::{
    Json,
    extract::{Path, State},
};
use layerink_core::api::{SegmentationState, SegmentationStatus, SegmentsResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::{AppError, check_id};
use crate::state::AppState;

/// `GET /api/segments/{id}`
pub async fn get_segments(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<SegmentsResponse>, AppError> {
    check_id(&image_id)?;
    let image = state
        .find_image(&image_id)
        .ok_or_else(|| AppError::not_found("Image not found"))?;

    let started = Instant::now();
    let segments = state.segmenter.segment(&image);
    let response = SegmentsResponse {
        image_id,
        segments,
        processing_time: started.elapsed().as_secs_f64(),
    };

    let record = serde_json::to_vec_pretty(&response)?;
    tokio::fs::write(state.segments_path(&response.image_id), record).await?;
    info!(
        "Segmented {} into {} segments",
        response.image_id,
        response.segments.len()
    );

    Ok(Json(response))
}

/// `GET /api/segments/{id}/status`
pub async fn segmentation_status(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<SegmentationStatus>, AppError> {
    check_id(&image_id)?;
    let done = tokio::fs::try_exists(state.segments_path(&image_id)).await?;
    let status = if done {
        SegmentationState::Completed
    } else {
        SegmentationState::Processing
    };
    Ok(Json(SegmentationStatus { image_id, status }))
}
