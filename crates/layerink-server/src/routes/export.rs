use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use layerink_core::api::ExportRequest;
use layerink_core::export::ExportFormat;
use std::sync::Arc;
use tracing::info;

use crate::compose;
use crate::error::{AppError, check_file_name, check_id};
use crate::state::AppState;

/// `POST /api/export`
pub async fn export_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let format: ExportFormat = request
        .format
        .parse()
        .map_err(|e: layerink_core::export::UnknownFormat| AppError::bad_request(e.to_string()))?;
    check_id(&request.image_id)?;
    let image = state
        .find_image(&request.image_id)
        .ok_or_else(|| AppError::not_found("Original image not found"))?;

    let stem = request
        .filename
        .clone()
        .unwrap_or_else(|| format!("export_{}_{}", request.image_id, format));
    let file_name = format!("{}.{}", stem, format.extension());
    check_file_name(&file_name)?;

    let bytes = match format {
        ExportFormat::Svg => {
            let (width, height) = (image.dimensions.width, image.dimensions.height);
            compose::svg_document(&image.filename, width, height, &request.layers).into_bytes()
        }
        ExportFormat::Psd => {
            let layers = request.layers;
            let path = image.path.clone();
            tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
                let base = image::open(&path)
                    .map_err(|e| AppError::internal(format!("Export failed: {}", e)))?
                    .to_rgba8();
                Ok(compose::psd_bytes(&compose::flatten(&base, &layers))?)
            })
            .await
            .map_err(|e| AppError::internal(format!("Export failed: {}", e)))??
        }
    };

    tokio::fs::write(state.config.export_dir.join(&file_name), &bytes).await?;
    info!("Exported {} ({} bytes)", file_name, bytes.len());
    Ok(attachment(&file_name, bytes))
}

/// `GET /api/export/{id}/download`
pub async fn download_export(
    State(state): State<Arc<AppState>>,
    Path(export_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_id(&export_id)?;
    let path = state
        .find_export(&export_id)
        .ok_or_else(|| AppError::not_found("Export file not found"))?;
    let bytes = tokio::fs::read(&path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(attachment(&file_name, bytes))
}

fn attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}
