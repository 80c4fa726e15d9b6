//! Editor configuration.

use crate::import::DEFAULT_SEGMENT_OPACITY;
use crate::scene::DEFAULT_FIT_RATIO;
use kurbo::Size;

/// Uploads above this size only produce a warning; the service enforces its own limit.
pub const DEFAULT_SOFT_UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// Editor configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Root URL of the LayerInk service.
    pub api_base_url: String,
    /// Size of the editing surface.
    pub surface_size: Size,
    /// Share of the surface the background image may cover.
    pub fit_ratio: f64,
    /// Opacity of freshly imported masks.
    pub segment_opacity: f64,
    pub soft_upload_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            surface_size: Size::new(800.0, 600.0),
            fit_ratio: DEFAULT_FIT_RATIO,
            segment_opacity: DEFAULT_SEGMENT_OPACITY,
            soft_upload_limit: DEFAULT_SOFT_UPLOAD_LIMIT,
        }
    }
}

impl EditorConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_surface_size(mut self, width: f64, height: f64) -> Self {
        self.surface_size = Size::new(width, height);
        self
    }
}
