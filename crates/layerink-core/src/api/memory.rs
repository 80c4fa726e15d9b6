//! In-memory collaborators.

use super::{
    ApiError, ApiResult, BoxFuture, Dimensions, ExportRequest, ExportService, SegmentationService,
    SegmentsResponse, UploadResponse, UploadService,
};
use crate::layer::SegmentDescriptor;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Answers every collaborator call from memory, for testing and offline use.
///
/// Uploads get sequential image ids. Segment and export replies are canned;
/// a failure can be armed so the next calls fail with a given error.
#[derive(Default)]
pub struct MemoryService {
    segments: RwLock<Vec<SegmentDescriptor>>,
    failure: RwLock<Option<ApiError>>,
    last_export: RwLock<Option<ExportRequest>>,
    uploads: AtomicUsize,
    segment_calls: AtomicUsize,
    exports: AtomicUsize,
}

impl MemoryService {
    /// Create a service with no canned segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service that returns `segments` on every segmentation call.
    pub fn with_segments(segments: Vec<SegmentDescriptor>) -> Self {
        Self {
            segments: RwLock::new(segments),
            ..Self::default()
        }
    }

    /// Make every following call fail with `error`. `None` disarms.
    pub fn fail_with(&self, error: Option<ApiError>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = error;
        }
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn segment_calls(&self) -> usize {
        self.segment_calls.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> usize {
        self.exports.load(Ordering::SeqCst)
    }

    /// The most recent export request.
    pub fn last_export(&self) -> Option<ExportRequest> {
        self.last_export.read().ok().and_then(|request| request.clone())
    }

    fn armed_failure(&self) -> ApiResult<()> {
        let failure = self
            .failure
            .read()
            .map_err(|e| ApiError::Transport(format!("Lock error: {}", e)))?;
        match failure.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl UploadService for MemoryService {
    fn upload<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, ApiResult<UploadResponse>> {
        Box::pin(async move {
            let count = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            self.armed_failure()?;
            let (width, height) = image::load_from_memory(&bytes)
                .map(|img| (img.width(), img.height()))
                .map_err(|_| ApiError::Status {
                    status: 400,
                    message: "Invalid image file".to_string(),
                })?;
            let image_id = format!("image-{}", count);
            Ok(UploadResponse {
                url: format!("/uploads/{}-{}", image_id, file_name),
                image_id,
                filename: file_name.to_string(),
                size: bytes.len() as u64,
                dimensions: Dimensions { width, height },
            })
        })
    }
}

impl SegmentationService for MemoryService {
    fn segments<'a>(&'a self, image_id: &'a str) -> BoxFuture<'a, ApiResult<SegmentsResponse>> {
        Box::pin(async move {
            self.segment_calls.fetch_add(1, Ordering::SeqCst);
            self.armed_failure()?;
            let segments = self
                .segments
                .read()
                .map_err(|e| ApiError::Transport(format!("Lock error: {}", e)))?
                .clone();
            Ok(SegmentsResponse {
                image_id: image_id.to_string(),
                segments,
                processing_time: 0.0,
            })
        })
    }
}

impl ExportService for MemoryService {
    fn export<'a>(&'a self, request: &'a ExportRequest) -> BoxFuture<'a, ApiResult<Vec<u8>>> {
        Box::pin(async move {
            self.exports.fetch_add(1, Ordering::SeqCst);
            self.armed_failure()?;
            if let Ok(mut last) = self.last_export.write() {
                *last = Some(request.clone());
            }
            let body = format!(
                "{}:{}:{}",
                request.format,
                request.image_id,
                request.layers.len()
            );
            Ok(body.into_bytes())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::png_bytes;

    #[test]
    fn test_upload_reports_dimensions() {
        let service = MemoryService::new();
        let response = pollster::block_on(service.upload("a.png", png_bytes(12, 8))).unwrap();
        assert_eq!(response.image_id, "image-1");
        assert_eq!(response.dimensions, Dimensions { width: 12, height: 8 });
        assert_eq!(service.upload_calls(), 1);
    }

    #[test]
    fn test_armed_failure() {
        let service = MemoryService::new();
        let error = ApiError::Transport("connection refused".to_string());
        service.fail_with(Some(error.clone()));
        assert_eq!(pollster::block_on(service.segments("x")), Err(error));
        assert_eq!(service.segment_calls(), 1);

        service.fail_with(None);
        assert!(pollster::block_on(service.segments("x")).is_ok());
    }
}
