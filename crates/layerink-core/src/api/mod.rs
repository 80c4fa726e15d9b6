//! Remote collaborators: upload, segmentation and export.
//!
//! Each collaborator is a trait returning boxed futures so the engine can be
//! driven by any executor. [`HttpClient`] talks to the LayerInk service;
//! [`MemoryService`] answers from memory for tests and offline use.

mod http;
mod memory;

pub use http::HttpClient;
pub use memory::MemoryService;

use crate::layer::{Layer, SegmentDescriptor};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future for collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Collaborator errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Result type for collaborator calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Natural size of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reply to an image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Opaque handle naming the image in later calls.
    pub image_id: String,
    /// Where the stored image can be fetched, relative to the service root.
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub dimensions: Dimensions,
}

/// Stored image metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub image_id: String,
    pub filename: String,
    pub size: u64,
    pub dimensions: Dimensions,
}

/// Reply to a segmentation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentsResponse {
    pub image_id: String,
    pub segments: Vec<SegmentDescriptor>,
    /// Seconds spent segmenting.
    pub processing_time: f64,
}

/// Progress of a segmentation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationState {
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationStatus {
    pub image_id: String,
    pub status: SegmentationState,
}

/// Request body for an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub image_id: String,
    pub layers: Vec<Layer>,
    /// Lowercase format name, `svg` or `psd`.
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Error body returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Accepts images and hands back an image handle.
pub trait UploadService: Send + Sync {
    fn upload<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, ApiResult<UploadResponse>>;
}

/// Produces segment descriptors for an uploaded image.
pub trait SegmentationService: Send + Sync {
    fn segments<'a>(&'a self, image_id: &'a str) -> BoxFuture<'a, ApiResult<SegmentsResponse>>;
}

/// Renders a layer list to a file.
pub trait ExportService: Send + Sync {
    fn export<'a>(&'a self, request: &'a ExportRequest) -> BoxFuture<'a, ApiResult<Vec<u8>>>;
}
