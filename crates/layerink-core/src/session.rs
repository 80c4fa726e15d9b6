//! Per-document context.

use crate::api::{Dimensions, UploadResponse};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle naming an uploaded image at the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The document currently being edited.
///
/// Import and export read the image handle from here; a fresh session starts
/// with every image load.
#[derive(Debug, Clone, Default)]
pub struct Session {
    handle: Option<ImageHandle>,
    source_url: Option<String>,
    file_name: Option<String>,
    dimensions: Option<Dimensions>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for a completed upload.
    pub fn begin(&mut self, upload: &UploadResponse) {
        log::info!("Session started for image {}", upload.image_id);
        *self = Self {
            handle: Some(ImageHandle::new(upload.image_id.clone())),
            source_url: Some(upload.url.clone()),
            file_name: Some(upload.filename.clone()),
            dimensions: Some(upload.dimensions),
        };
    }

    pub fn image_handle(&self) -> Option<&ImageHandle> {
        self.handle.as_ref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
