//! Scene graph adapter.
//!
//! Owns the editing surface and the index from layer id to scene object, and
//! projects layer records onto object properties:
//! - image load: fit, center and register the background object
//! - reconciliation: push visibility, opacity, lock state and mask fill
//! - selection projection: mirror the canonical selection as the active object
//!
//! The scene is a projection of the layer store. The only information that
//! flows back out is pointer selection, reported as [`SceneEvent`]s.

mod loader;
mod object;

pub use loader::{DecodedImage, DecodingLoader, ImageLoader, ImageSource};
pub use object::{Geometry, Placement, SceneObject};

#[cfg(test)]
pub(crate) use loader::png_bytes;

use crate::color::SerializableColor;
use crate::layer::{BASE_LAYER_ID, Layer, LayerId, LayerKind, SegmentDescriptor, clamp_opacity};
use kurbo::{BezPath, Point, Size};
use std::collections::HashMap;
use thiserror::Error;

/// Share of the surface, per axis, the background image may cover.
pub const DEFAULT_FIT_RATIO: f64 = 0.8;

/// Scene errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("Image decode failed: {0}")]
    ImageDecode(String),
    #[error("Scene object already exists: {0}")]
    DuplicateObject(LayerId),
    #[error("No scene object for layer: {0}")]
    UnknownObject(LayerId),
    #[error("Invalid path for {id}: {reason}")]
    InvalidPath { id: LayerId, reason: String },
    #[error("Invalid color for {id}: {color}")]
    InvalidColor { id: LayerId, color: String },
}

/// Pointer selection changes reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// An object carrying this layer tag was picked.
    Selected(LayerId),
    /// The pointer hit empty space or a non-selectable object.
    Cleared,
}

/// The editing surface and its layer index.
#[derive(Debug)]
pub struct SceneAdapter {
    size: Size,
    fit_ratio: f64,
    objects: HashMap<LayerId, SceneObject>,
    /// Paint order (back to front).
    paint_order: Vec<LayerId>,
    active: Option<LayerId>,
    frames: u64,
}

impl SceneAdapter {
    /// Create a surface of the given size with an empty index.
    pub fn mount(size: Size) -> Self {
        log::debug!("Mounting surface {}x{}", size.width, size.height);
        Self {
            size,
            fit_ratio: DEFAULT_FIT_RATIO,
            objects: HashMap::new(),
            paint_order: Vec::new(),
            active: None,
            frames: 0,
        }
    }

    /// Set the share of the surface the background image may cover.
    pub fn with_fit_ratio(mut self, fit_ratio: f64) -> Self {
        self.fit_ratio = fit_ratio;
        self
    }

    /// Release the surface. The index goes with it.
    pub fn dispose(self) {
        log::debug!(
            "Disposing surface with {} objects after {} frames",
            self.objects.len(),
            self.frames
        );
    }

    /// Decode an image and place it as the background object.
    ///
    /// Nothing is created if decoding fails.
    pub async fn load_image(
        &mut self,
        loader: &dyn ImageLoader,
        source: &ImageSource,
    ) -> Result<Placement, SceneError> {
        let decoded = loader.load(source).await?;
        self.place_base_image(decoded.width, decoded.height)
    }

    /// Place an already decoded image as the background object.
    pub fn place_base_image(&mut self, width: u32, height: u32) -> Result<Placement, SceneError> {
        if self.objects.contains_key(BASE_LAYER_ID) {
            return Err(SceneError::DuplicateObject(BASE_LAYER_ID.to_string()));
        }
        if width == 0 || height == 0 {
            return Err(SceneError::ImageDecode(format!("empty image {}x{}", width, height)));
        }

        let placement = Placement::fit(self.size, width as f64, height as f64, self.fit_ratio);
        let object = SceneObject::raster(BASE_LAYER_ID, width, height, placement);
        self.objects.insert(BASE_LAYER_ID.to_string(), object);
        self.paint_order.insert(0, BASE_LAYER_ID.to_string());
        log::info!(
            "Placed {}x{} image at ({:.1}, {:.1}) scale {:.3}",
            width,
            height,
            placement.left,
            placement.top,
            placement.scale
        );
        self.request_repaint();
        Ok(placement)
    }

    /// Push layer fields onto their mapped objects.
    ///
    /// Layers without an object are skipped; this pass never creates or
    /// removes objects. Paint order of mapped objects follows list order.
    pub fn reconcile(&mut self, layers: &[Layer]) {
        let mut updated = 0;
        for layer in layers {
            let Some(object) = self.objects.get_mut(&layer.id) else {
                continue;
            };
            // The background image never takes pointer input.
            let pickable = !layer.locked && layer.kind != LayerKind::Image;
            object.visible = layer.visible;
            object.opacity = layer.opacity;
            object.selectable = pickable;
            object.interactive = pickable;

            if layer.kind == LayerKind::Mask {
                if let Some(fill) = layer.color.as_deref().and_then(SerializableColor::from_hex) {
                    object.fill = Some(fill);
                }
            }
            updated += 1;
        }

        let mut order: Vec<LayerId> = layers
            .iter()
            .filter(|layer| self.objects.contains_key(&layer.id))
            .map(|layer| layer.id.clone())
            .collect();
        // Objects whose record has not landed yet keep their relative order on top.
        for id in &self.paint_order {
            if !order.contains(id) {
                order.push(id.clone());
            }
        }
        self.paint_order = order;

        log::debug!("Reconciled {} of {} layers", updated, layers.len());
        self.request_repaint();
    }

    /// Mirror the canonical selection as the surface's active object.
    ///
    /// Ids without an object, or whose object is not selectable, leave the
    /// surface with no active object. Returns true if an object is active.
    pub fn project_selection(&mut self, selection: Option<&str>) -> bool {
        self.active = selection
            .and_then(|id| self.objects.get(id))
            .filter(|object| object.selectable)
            .map(|object| object.layer_id().to_string());
        self.request_repaint();
        self.active.is_some()
    }

    /// Build a mask object from segment geometry and register it at the top.
    ///
    /// Does not repaint; importers repaint once per batch.
    pub fn materialize_segment(
        &mut self,
        segment: &SegmentDescriptor,
        opacity: f64,
    ) -> Result<(), SceneError> {
        let path = BezPath::from_svg(&segment.path).map_err(|e| SceneError::InvalidPath {
            id: segment.id.clone(),
            reason: e.to_string(),
        })?;
        let fill = SerializableColor::from_hex(&segment.color).ok_or_else(|| SceneError::InvalidColor {
            id: segment.id.clone(),
            color: segment.color.clone(),
        })?;

        let mut object = SceneObject::path(segment.id.clone(), LayerKind::Mask, path, fill);
        object.opacity = clamp_opacity(opacity);
        self.insert_object(object)
    }

    /// Register an object at the top of the paint order.
    pub fn insert_object(&mut self, object: SceneObject) -> Result<(), SceneError> {
        let id = object.layer_id().to_string();
        if self.objects.contains_key(&id) {
            return Err(SceneError::DuplicateObject(id));
        }
        self.paint_order.push(id.clone());
        self.objects.insert(id, object);
        Ok(())
    }

    /// Copy the object of `source` under a new layer tag.
    pub fn clone_object(&mut self, source: &str, new_id: &str) -> Result<(), SceneError> {
        let copy = self
            .objects
            .get(source)
            .ok_or_else(|| SceneError::UnknownObject(source.to_string()))?
            .retagged(new_id);
        self.insert_object(copy)?;
        self.request_repaint();
        Ok(())
    }

    /// Remove the object for a layer.
    pub fn remove_object(&mut self, id: &str) -> Option<SceneObject> {
        let object = self.detach_object(id)?;
        self.request_repaint();
        Some(object)
    }

    /// Remove the object for a layer without repainting.
    pub fn detach_object(&mut self, id: &str) -> Option<SceneObject> {
        let object = self.objects.remove(id)?;
        self.paint_order.retain(|other| other != id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        Some(object)
    }

    /// Topmost visible, interactive object under a surface point.
    pub fn hit_test(&self, point: Point) -> Option<&SceneObject> {
        self.paint_order
            .iter()
            .rev()
            .filter_map(|id| self.objects.get(id))
            .find(|object| object.visible && object.interactive && object.hit_test(point))
    }

    /// Translate a pointer press into a selection event.
    ///
    /// The surface does not change its own active object here; it waits for
    /// the coordinator to project the resulting selection.
    pub fn pointer_down(&self, point: Point) -> SceneEvent {
        match self.hit_test(point) {
            Some(object) if object.selectable => SceneEvent::Selected(object.layer_id().to_string()),
            _ => SceneEvent::Cleared,
        }
    }

    /// Schedule a redraw of the surface.
    pub fn request_repaint(&mut self) {
        self.frames += 1;
    }

    /// Number of repaints requested since mount.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Layer tag of the active object, if any.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Layer tags in paint order (back to front).
    pub fn paint_order(&self) -> &[LayerId] {
        &self.paint_order
    }

    /// Objects in paint order (back to front).
    pub fn objects_ordered(&self) -> impl Iterator<Item = &SceneObject> {
        self.paint_order.iter().filter_map(|id| self.objects.get(id))
    }
}
