//! Renderable objects on the editing surface.

use crate::color::SerializableColor;
use crate::layer::{LayerId, LayerKind};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use peniko::Color;

/// Position and uniform scale of an object on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub scale: f64,
}

impl Placement {
    /// Unscaled, at the surface origin.
    pub const ORIGIN: Self = Self {
        left: 0.0,
        top: 0.0,
        scale: 1.0,
    };

    /// Scale an image to fit within `ratio` of the surface on both axes,
    /// preserving aspect ratio, and center it.
    pub fn fit(surface: Size, width: f64, height: f64, ratio: f64) -> Self {
        let scale = f64::min(ratio * surface.width / width, ratio * surface.height / height);
        Self {
            left: (surface.width - width * scale) / 2.0,
            top: (surface.height - height * scale) / 2.0,
            scale,
        }
    }

    /// Object-to-surface transform.
    pub fn affine(&self) -> Affine {
        Affine::translate((self.left, self.top)) * Affine::scale(self.scale)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Geometry of a scene object, in object coordinates.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// A raster image of the given natural size.
    Raster { width: u32, height: u32 },
    /// A filled vector path.
    Path(BezPath),
}

/// A renderable unit tagged with the layer it represents.
#[derive(Debug, Clone)]
pub struct SceneObject {
    layer_id: LayerId,
    kind: LayerKind,
    geometry: Geometry,
    placement: Placement,
    /// Whether the object is drawn.
    pub visible: bool,
    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f64,
    /// Whether the object can become the active object.
    pub selectable: bool,
    /// Whether the object receives pointer events.
    pub interactive: bool,
    /// Fill color for path objects.
    pub fill: Option<SerializableColor>,
}

impl SceneObject {
    /// A raster object. Starts non-selectable and non-interactive.
    pub fn raster(layer_id: impl Into<LayerId>, width: u32, height: u32, placement: Placement) -> Self {
        Self {
            layer_id: layer_id.into(),
            kind: LayerKind::Image,
            geometry: Geometry::Raster { width, height },
            placement,
            visible: true,
            opacity: 1.0,
            selectable: false,
            interactive: false,
            fill: None,
        }
    }

    /// A filled path object at the origin.
    pub fn path(layer_id: impl Into<LayerId>, kind: LayerKind, path: BezPath, fill: SerializableColor) -> Self {
        Self {
            layer_id: layer_id.into(),
            kind,
            geometry: Geometry::Path(path),
            placement: Placement::ORIGIN,
            visible: true,
            opacity: 1.0,
            selectable: true,
            interactive: true,
            fill: Some(fill),
        }
    }

    /// The tag naming the layer this object represents.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Copy of this object tagged with another layer id.
    pub fn retagged(&self, layer_id: impl Into<LayerId>) -> Self {
        Self {
            layer_id: layer_id.into(),
            ..self.clone()
        }
    }

    /// Fill as a peniko color, with the object opacity applied.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(|c| c.with_opacity(self.opacity).into())
    }

    /// Bounding box on the surface.
    pub fn bounds(&self) -> Rect {
        let local = match &self.geometry {
            Geometry::Raster { width, height } => Rect::new(0.0, 0.0, *width as f64, *height as f64),
            Geometry::Path(path) => path.bounding_box(),
        };
        self.placement.affine().transform_rect_bbox(local)
    }

    /// Check if a surface point hits this object.
    pub fn hit_test(&self, point: Point) -> bool {
        match &self.geometry {
            Geometry::Raster { .. } => self.bounds().contains(point),
            Geometry::Path(path) => {
                let local = self.placement.affine().inverse() * point;
                path.contains(local)
            }
        }
    }
}
