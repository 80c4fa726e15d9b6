use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
};
use layerink_core::api::{Dimensions, UploadInfo, UploadResponse};
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, check_file_name, check_id};
use crate::state::{AppState, StoredImage};

/// `POST /api/upload`
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            file = Some((name, data));
        }
    }
    let (name, data) = file.ok_or_else(|| AppError::bad_request("file field missing"))?;

    let extension = extension_of(&name);
    let config = &state.config;
    if !config.allowed_extensions.contains(&extension) {
        return Err(AppError::bad_request(format!(
            "File type {} not allowed. Allowed types: {}",
            extension,
            config.allowed_extensions.join(", ")
        )));
    }
    if data.len() > config.max_file_size {
        return Err(AppError::bad_request(format!(
            "File too large. Maximum size: {:.1}MB",
            config.max_file_size_mb()
        )));
    }

    let (width, height) = image::ImageReader::new(Cursor::new(&data[..]))
        .with_guessed_format()
        .map_err(|e| AppError::bad_request(format!("Invalid image file: {}", e)))?
        .into_dimensions()
        .map_err(|e| AppError::bad_request(format!("Invalid image file: {}", e)))?;

    let image_id = Uuid::new_v4().to_string();
    let filename = format!("{}{}", image_id, extension);
    let path = config.upload_dir.join(&filename);
    tokio::fs::write(&path, &data).await?;

    let dimensions = Dimensions { width, height };
    state.remember(StoredImage {
        image_id: image_id.clone(),
        path,
        filename: filename.clone(),
        size: data.len() as u64,
        dimensions,
    });
    info!("Stored upload {} ({}, {}x{}, {} bytes)", image_id, name, width, height, data.len());

    Ok(Json(UploadResponse {
        image_id,
        url: format!("/uploads/{}", filename),
        filename,
        size: data.len() as u64,
        dimensions,
    }))
}

/// `GET /api/upload/{id}/info`
pub async fn upload_info(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<UploadInfo>, AppError> {
    check_id(&image_id)?;
    let image = state
        .find_image(&image_id)
        .ok_or_else(|| AppError::not_found("File not found"))?;
    Ok(Json(UploadInfo {
        image_id: image.image_id,
        filename: image.filename,
        size: image.size,
        dimensions: image.dimensions,
    }))
}

/// `GET /uploads/{file}`
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_file_name(&file)?;
    let path = state.config.upload_dir.join(&file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::not_found("File not found"))?;
    let mime = image::ImageFormat::from_path(&path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}

/// Lowercase extension with the leading dot, or an empty string.
fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}
