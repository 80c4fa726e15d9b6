use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use layerink_core::api::ErrorBody;
use thiserror::Error;

use crate::compose::ComposeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Http { status, message } => (*status, message.clone()),
            AppError::Io(err) => {
                tracing::error!("storage failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
            AppError::Serde(err) => {
                tracing::error!("serialization failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization error".to_string())
            }
            AppError::Compose(err) => (StatusCode::BAD_REQUEST, format!("Export failed: {}", err)),
        };
        let body = Json(ErrorBody { error: message });
        (status, body).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::payload_too_large("multipart payload too large"),
            _ => AppError::bad_request(err.body_text()),
        }
    }
}

/// Reject identifiers that could escape the storage directories.
pub fn check_id(id: &str) -> Result<(), AppError> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("Invalid identifier: {}", id)))
    }
}

/// Reject file names with path components.
pub fn check_file_name(name: &str) -> Result<(), AppError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("Invalid file name: {}", name)))
    }
}
