//! Ordered layer list and selected layer id.

use crate::layer::{Layer, LayerId, LayerKind, LayerPatch};
use thiserror::Error;
use uuid::Uuid;

/// Layer store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),
    #[error("Document already has an image layer: {0}")]
    SecondImageLayer(LayerId),
    #[error("The image layer cannot be duplicated")]
    DuplicateImageLayer,
    #[error("Layer {0} cannot change to or from the image kind")]
    ImageKindChange(LayerId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The ordered list of layers of one document.
///
/// List order is paint order: the first layer paints first (bottom-most).
/// The store knows nothing about rendering.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: Vec<Layer>,
    selected: Option<LayerId>,
    revision: u64,
}

impl LayerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a layer at the top, or replace the layer with the same id in place.
    ///
    /// Returns `true` if an existing layer was replaced. A replacement keeps
    /// the image kind if it had it and never gains it.
    pub fn add_or_replace(&mut self, layer: Layer) -> StoreResult<bool> {
        if let Some(pos) = self.position(&layer.id) {
            if (self.layers[pos].kind == LayerKind::Image) != (layer.kind == LayerKind::Image) {
                return Err(StoreError::ImageKindChange(layer.id));
            }
            self.layers[pos] = layer;
            self.touch();
            return Ok(true);
        }
        if layer.kind == LayerKind::Image && self.layers.iter().any(Layer::is_base_image) {
            return Err(StoreError::SecondImageLayer(layer.id));
        }
        self.layers.push(layer);
        self.touch();
        Ok(false)
    }

    /// Apply a partial update to an existing layer.
    ///
    /// Unknown ids are rejected and leave the list untouched.
    pub fn update(&mut self, id: &str, patch: &LayerPatch) -> StoreResult<&Layer> {
        let Some(pos) = self.position(id) else {
            log::warn!("Rejected update of unknown layer {}", id);
            return Err(StoreError::LayerNotFound(id.to_string()));
        };
        patch.apply_to(&mut self.layers[pos]);
        self.touch();
        Ok(&self.layers[pos])
    }

    /// Remove a layer.
    ///
    /// Selection is not touched here; clearing it is the selection
    /// coordinator's job.
    pub fn remove(&mut self, id: &str) -> Option<Layer> {
        let pos = self.position(id)?;
        let layer = self.layers.remove(pos);
        self.touch();
        Some(layer)
    }

    /// Set or clear the selected layer id.
    pub fn select(&mut self, id: Option<LayerId>) {
        if self.selected != id {
            self.selected = id;
            self.touch();
        }
    }

    /// The selected layer id, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected layer record, if any.
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected().and_then(|id| self.get(id))
    }

    /// Layers in paint order (bottom to top).
    pub fn list(&self) -> &[Layer] {
        &self.layers
    }

    /// Owned copy of the layer list.
    pub fn snapshot(&self) -> Vec<Layer> {
        self.layers.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Index of a layer in paint order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Remove all layers and the selection.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected = None;
        self.touch();
    }

    /// Copy a layer to the top of the list under a fresh id.
    ///
    /// The copy keeps every field except `id` and gets `" Copy"` appended to
    /// its name. Returns the new id.
    pub fn duplicate(&mut self, id: &str) -> StoreResult<LayerId> {
        let source = self
            .get(id)
            .ok_or_else(|| StoreError::LayerNotFound(id.to_string()))?;
        if source.is_base_image() {
            return Err(StoreError::DuplicateImageLayer);
        }

        let mut copy = source.clone();
        copy.id = self.fresh_copy_id(id);
        copy.name = format!("{} Copy", source.name);
        let new_id = copy.id.clone();

        self.layers.push(copy);
        self.touch();
        Ok(new_id)
    }

    /// Move a layer one step towards the top.
    /// Returns true if the layer was moved.
    pub fn move_up(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if self.layers[pos].is_base_image() || pos + 1 >= self.layers.len() {
            return false;
        }
        self.layers.swap(pos, pos + 1);
        self.touch();
        true
    }

    /// Move a layer one step towards the bottom.
    /// Returns true if the layer was moved. Nothing moves below the image layer.
    pub fn move_down(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if pos == 0 || self.layers[pos].is_base_image() || self.layers[pos - 1].is_base_image() {
            return false;
        }
        self.layers.swap(pos, pos - 1);
        self.touch();
        true
    }

    fn fresh_copy_id(&self, id: &str) -> LayerId {
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}-copy-{}", id, &suffix[..8]);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
