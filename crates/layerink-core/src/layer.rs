//! Layer records and their payloads.

use serde::{Deserialize, Serialize};

/// Unique identifier for layers within a document.
pub type LayerId = String;

/// Reserved identifier of the background image layer.
pub const BASE_LAYER_ID: &str = "image-base";

/// Display name of the background image layer.
pub const BASE_LAYER_NAME: &str = "Background Image";

/// Kind of content a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// The uploaded raster image. At most one per document.
    Image,
    /// A segment mask imported from the segmentation service.
    Mask,
    /// A vector shape.
    Shape,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Image => "image",
            LayerKind::Mask => "mask",
            LayerKind::Shape => "shape",
        }
    }
}

/// Axis-aligned bounding box reported with a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A segment as delivered by the segmentation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    pub id: String,
    pub name: String,
    /// SVG path data.
    pub path: String,
    /// Suggested fill, as a hex color.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Source data carried by a layer, one variant per layer kind.
///
/// The synchronization engine passes payloads through untouched; only the
/// export side reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerPayload {
    Image { src: String },
    Mask(SegmentDescriptor),
    Shape { path: String },
}

impl LayerPayload {
    /// The layer kind this payload belongs to.
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerPayload::Image { .. } => LayerKind::Image,
            LayerPayload::Mask(_) => LayerKind::Mask,
            LayerPayload::Shape { .. } => LayerKind::Shape,
        }
    }

    /// Vector path data, for the kinds that have one.
    pub fn path(&self) -> Option<&str> {
        match self {
            LayerPayload::Image { .. } => None,
            LayerPayload::Mask(segment) => Some(&segment.path),
            LayerPayload::Shape { path } => Some(path),
        }
    }
}

/// One entry of the layer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub visible: bool,
    pub locked: bool,
    /// Fill color as a hex string.
    #[serde(default)]
    pub color: Option<String>,
    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f64,
    pub data: LayerPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Layer {
    /// The background layer seeded when an image is loaded.
    pub fn base_image(src: impl Into<String>) -> Self {
        Self {
            id: BASE_LAYER_ID.to_string(),
            name: BASE_LAYER_NAME.to_string(),
            kind: LayerKind::Image,
            visible: true,
            locked: false,
            color: None,
            opacity: 1.0,
            data: LayerPayload::Image { src: src.into() },
            thumbnail: None,
        }
    }

    /// A mask layer for an imported segment.
    pub fn from_segment(segment: SegmentDescriptor, opacity: f64) -> Self {
        Self {
            id: segment.id.clone(),
            name: segment.name.clone(),
            kind: LayerKind::Mask,
            visible: true,
            locked: false,
            color: Some(segment.color.clone()),
            opacity: clamp_opacity(opacity),
            data: LayerPayload::Mask(segment),
            thumbnail: None,
        }
    }

    pub fn is_base_image(&self) -> bool {
        self.kind == LayerKind::Image
    }
}

/// A partial update of a layer's editable fields.
///
/// `None` leaves a field untouched. For the optional fields, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub color: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
}

impl LayerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn color(mut self, color: Option<String>) -> Self {
        self.color = Some(color);
        self
    }

    pub fn thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the set fields onto `layer`.
    pub fn apply_to(&self, layer: &mut Layer) {
        if let Some(name) = &self.name {
            layer.name = name.clone();
        }
        if let Some(visible) = self.visible {
            layer.visible = visible;
        }
        if let Some(locked) = self.locked {
            layer.locked = locked;
        }
        if let Some(opacity) = self.opacity {
            layer.opacity = clamp_opacity(opacity);
        }
        if let Some(color) = &self.color {
            layer.color = color.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            layer.thumbnail = thumbnail.clone();
        }
    }
}

/// Clamp an opacity into `[0, 1]`; NaN becomes fully opaque.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}
