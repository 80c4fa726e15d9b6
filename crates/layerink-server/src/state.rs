//! Shared service state.

use crate::config::ServerConfig;
use crate::segmenter::{PlaceholderSegmenter, Segmenter};
use dashmap::DashMap;
use layerink_core::api::Dimensions;
use std::path::PathBuf;
use tracing::warn;

/// An uploaded image on disk.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub image_id: String,
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
    pub dimensions: Dimensions,
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub segmenter: Box<dyn Segmenter>,
    /// Known uploads, keyed by image id
    images: DashMap<String, StoredImage>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_segmenter(config, Box::new(PlaceholderSegmenter))
    }

    pub fn with_segmenter(config: ServerConfig, segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            config,
            segmenter,
            images: DashMap::new(),
        }
    }

    /// Record a fresh upload.
    pub fn remember(&self, image: StoredImage) {
        self.images.insert(image.image_id.clone(), image);
    }

    /// Look up an upload, falling back to the upload directory for images
    /// stored by an earlier run.
    pub fn find_image(&self, image_id: &str) -> Option<StoredImage> {
        if let Some(image) = self.images.get(image_id) {
            return Some(image.clone());
        }

        let entries = std::fs::read_dir(&self.config.upload_dir).ok()?;
        let path = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| path.file_stem().is_some_and(|stem| stem == image_id))?;

        let size = std::fs::metadata(&path).ok()?.len();
        let (width, height) = match image::image_dimensions(&path) {
            Ok(dims) => dims,
            Err(err) => {
                warn!("Unreadable upload {}: {}", path.display(), err);
                return None;
            }
        };
        let image = StoredImage {
            image_id: image_id.to_string(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
            size,
            dimensions: Dimensions { width, height },
        };
        self.remember(image.clone());
        Some(image)
    }

    /// Where segmentation results for an image are recorded.
    pub fn segments_path(&self, image_id: &str) -> PathBuf {
        self.config.processed_dir.join(format!("{}_segments.json", image_id))
    }

    /// Find an export whose file name contains `export_id`.
    pub fn find_export(&self, export_id: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.config.export_dir).ok()?;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().contains(export_id))
            })
            .collect();
        matches.sort();
        matches.into_iter().next()
    }
}
